//! Caller-facing error kinds for the scanning core.

use thiserror::Error;

/// Recoverable domain errors returned by core operations.
///
/// None of these are fatal to the process; the HTTP boundary maps each
/// variant to a status code and a JSON error payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// No user with the given id exists.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// The user's credit balance is exhausted for the day.
    #[error("not enough credits; request more or wait until tomorrow")]
    InsufficientCredits,

    /// A credit request amount must be a positive integer.
    #[error("requested amount must be greater than zero")]
    InvalidAmount,

    /// No credit request with the given id exists.
    #[error("no such credit request: {0}")]
    NotFound(String),

    /// The credit request was already approved or denied.
    #[error("credit request already resolved: {0}")]
    AlreadyResolved(String),
}

impl ScanError {
    /// Stable machine-readable kind string, used in API error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::UnknownUser(_) => "unknown_user",
            ScanError::InsufficientCredits => "insufficient_credits",
            ScanError::InvalidAmount => "invalid_amount",
            ScanError::NotFound(_) => "not_found",
            ScanError::AlreadyResolved(_) => "already_resolved",
        }
    }
}
