//! Docscan - document similarity scanning with daily credit quotas
//!
//! This library provides the core engine (document store, edit-distance
//! similarity, quota ledger, credit-request workflow, analytics) and the
//! HTTP boundary for the docscan binary.

pub mod analytics;
pub mod config;
pub mod error;
pub mod ledger;
pub mod requests;
pub mod scanner;
pub mod server;
pub mod similarity;
pub mod store;
pub mod topics;

pub use error::ScanError;
pub use scanner::{ScanEngine, ScanOutcome};
