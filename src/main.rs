//! docscan: document similarity scanning service.
//!
//! Usage:
//!   docscan [--port 8900] [--config docscan.toml] [--threshold 50] [--no-seed]
//!
//! Environment variables (also read from .env):
//!   DOCSCAN_PORT   - Port to listen on (default: 8900)
//!   DOCSCAN_CONFIG - Path to the TOML config file (optional)

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use docscan::config::Config;
use docscan::ledger::{Role, User};
use docscan::scanner::ScanEngine;
use docscan::server;
use std::path::PathBuf;
use std::sync::Arc;

/// Seeded admin balance, matching the fixture account shipped with the
/// reference deployment.
const SEED_ADMIN_CREDITS: u32 = 999;

#[derive(Debug, Parser)]
#[command(name = "docscan", about = "Document similarity scanning service")]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(long, env = "DOCSCAN_PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(long, env = "DOCSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Similarity threshold override
    #[arg(long)]
    threshold: Option<f64>,

    /// Skip seeding the fixture admin/user accounts
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(threshold) = args.threshold {
        config.similarity.threshold = threshold;
    }
    if args.no_seed {
        config.seed_accounts = false;
    }

    let backend = config.build_backend()?;
    let engine = Arc::new(ScanEngine::with_backend(backend, config.similarity.threshold));

    if config.seed_accounts {
        seed_accounts(&engine);
    }

    eprintln!("docscan starting...");
    if let Err(e) = server::run(config.port, engine).await {
        eprintln!("Fatal error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Seed the two fixture accounts so a fresh instance is immediately
/// exercisable: an admin reviewer and a regular user.
fn seed_accounts(engine: &ScanEngine) {
    let admin = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: "admin".to_string(),
        role: Role::Admin,
        credits: SEED_ADMIN_CREDITS,
        scans_today: 0,
        last_reset: Utc::now(),
    };
    eprintln!("[server] seeded admin account id={}", admin.id);
    engine.seed_user(admin);

    let user = engine.register_user("user", Role::User);
    eprintln!("[server] seeded user account id={}", user.id);
}
