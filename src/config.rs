//! Service configuration.

use crate::similarity::{EditDistanceBackend, RemoteBackend, SimilarityBackend, DEFAULT_THRESHOLD};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which similarity scoring backend the scan operation uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Deterministic in-process Levenshtein scoring
    #[default]
    EditDistance,
    /// External HTTP similarity service
    Remote,
}

/// Remote backend settings. Ignored unless `backend = "remote"`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Scoring service URL
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API key, or an env var reference like ${DOCSCAN_SIMILARITY_KEY}
    #[serde(default)]
    pub api_key: Option<String>,
}

impl RemoteConfig {
    /// Resolve the API key from the environment if configured indirectly.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.as_ref().and_then(|key| {
            if key.starts_with("${") && key.ends_with('}') {
                let env_var = &key[2..key.len() - 1];
                std::env::var(env_var).ok()
            } else {
                Some(key.clone())
            }
        })
    }
}

/// Similarity engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimilarityConfig {
    /// Minimum score for a document to appear in scan results
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Scoring backend selection
    #[serde(default)]
    pub backend: BackendKind,

    /// Remote backend settings
    #[serde(default)]
    pub remote: RemoteConfig,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            backend: BackendKind::default(),
            remote: RemoteConfig::default(),
        }
    }
}

/// Top-level configuration, loadable from a TOML file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seed the fixture admin/user accounts at startup
    #[serde(default = "default_true")]
    pub seed_accounts: bool,

    #[serde(default)]
    pub similarity: SimilarityConfig,
}

fn default_port() -> u16 {
    8900
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            seed_accounts: true,
            similarity: SimilarityConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Construct the configured similarity backend.
    pub fn build_backend(&self) -> Result<Box<dyn SimilarityBackend>> {
        match self.similarity.backend {
            BackendKind::EditDistance => Ok(Box::new(EditDistanceBackend)),
            BackendKind::Remote => {
                let endpoint = self
                    .similarity
                    .remote
                    .endpoint
                    .clone()
                    .context("similarity.remote.endpoint is required for the remote backend")?;
                let api_key = self.similarity.remote.resolve_api_key();
                Ok(Box::new(RemoteBackend::new(endpoint, api_key)))
            }
        }
    }
}
