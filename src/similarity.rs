//! Edit-distance document similarity.
//!
//! The default scoring path is a pure function over the corpus: classic
//! Levenshtein distance normalized to a 0-100 score. An alternate remote
//! scoring backend can be selected via configuration; it shares the same
//! interface shape but is never required for correctness.

use crate::store::Document;
use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default similarity threshold for scan results.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// A ranked match against one corpus document. Transient; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Matched document id
    pub document_id: String,
    /// Matched document title
    pub title: String,
    /// Similarity score in [0, 100], rounded to 2 decimal places
    pub similarity: f64,
}

/// Classic single-character insert/delete/substitute edit distance.
///
/// Full dynamic programming over the char sequences, case-sensitive, no
/// normalization. O(len(a) * len(b)) time, O(len(a)) space.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // prev[j] holds the distance between a[..i] and b[..j] for the
    // previous row i; rolled forward one row at a time.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let insertion = curr[j] + 1;
            let deletion = prev[j + 1] + 1;
            curr[j + 1] = substitution.min(insertion).min(deletion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity score between two texts: 0 (nothing shared) to 100 (equal).
///
/// Two empty strings are defined as identical (100).
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }

    let distance = levenshtein(a, b);
    let score = (1.0 - distance as f64 / max_len as f64) * 100.0;
    // Round to 2 decimal places
    (score * 100.0).round() / 100.0
}

/// Score `query` against every document and return those at or above
/// `threshold`, highest first. The sort is stable, so equal scores keep
/// corpus order.
pub fn find_similar(query: &str, corpus: &[Document], threshold: f64) -> Vec<ScanResult> {
    let mut results: Vec<ScanResult> = corpus
        .iter()
        .filter_map(|doc| {
            let score = similarity(query, &doc.content);
            (score >= threshold).then(|| ScanResult {
                document_id: doc.id.clone(),
                title: doc.title.clone(),
                similarity: score,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    results
}

/// Pluggable scoring strategy behind the scan operation.
///
/// The edit-distance backend is the default and the only one the core's
/// correctness depends on; the remote backend exists as a configurable
/// alternative and may fail on transport or parse errors.
pub trait SimilarityBackend: Send + Sync {
    fn rank(&self, query: &str, corpus: &[Document], threshold: f64) -> Result<Vec<ScanResult>>;
}

/// Deterministic in-process backend.
#[derive(Debug, Default)]
pub struct EditDistanceBackend;

impl SimilarityBackend for EditDistanceBackend {
    fn rank(&self, query: &str, corpus: &[Document], threshold: f64) -> Result<Vec<ScanResult>> {
        Ok(find_similar(query, corpus, threshold))
    }
}

#[derive(Debug, Serialize)]
struct RemoteScoreRequest<'a> {
    prompt: String,
    document: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteScoreResponse {
    text: String,
}

static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*%").unwrap());

/// Remote scoring backend: POSTs each query/document pair to an external
/// similarity service and extracts a percentage from the free-text reply.
pub struct RemoteBackend {
    endpoint: String,
    api_key: Option<String>,
    // Built on first use: the blocking client must be constructed off the
    // async runtime, and rank() always runs on a blocking thread.
    client: once_cell::sync::OnceCell<reqwest::blocking::Client>,
}

impl RemoteBackend {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            endpoint,
            api_key,
            client: once_cell::sync::OnceCell::new(),
        }
    }

    fn score_pair(&self, query: &str, content: &str) -> Result<f64> {
        let body = RemoteScoreRequest {
            prompt: format!(
                "Compare the following two documents and provide a percentage \
                 similarity score (0-100) based on their content.\n\n\
                 Document 1:\n{}\n\nDocument 2:\n{}\n\nSimilarity Percentage:",
                query, content
            ),
            document: content,
        };

        let client = self.client.get_or_init(reqwest::blocking::Client::new);
        let mut req = client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp: RemoteScoreResponse = req
            .send()
            .context("similarity service request failed")?
            .error_for_status()
            .context("similarity service returned an error status")?
            .json()
            .context("similarity service reply was not JSON")?;

        let caps = PERCENT_RE
            .captures(&resp.text)
            .ok_or_else(|| anyhow!("no percentage in similarity service reply"))?;
        let pct: f64 = caps[1].parse()?;
        if !(0.0..=100.0).contains(&pct) {
            return Err(anyhow!("similarity service returned {} (out of range)", pct));
        }
        Ok(pct)
    }
}

impl SimilarityBackend for RemoteBackend {
    fn rank(&self, query: &str, corpus: &[Document], threshold: f64) -> Result<Vec<ScanResult>> {
        let mut results = Vec::new();
        for doc in corpus {
            let score = self.score_pair(query, &doc.content)?;
            if score >= threshold {
                results.push(ScanResult {
                    document_id: doc.id.clone(),
                    title: doc.title.clone(),
                    similarity: score,
                });
            }
        }
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        Ok(results)
    }
}
