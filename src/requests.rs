//! Credit request workflow: pending -> approved | denied.

use crate::error::ScanError;
use crate::ledger::CreditLedger;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Lifecycle state of a credit request. Terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

/// A user's request for additional scan credits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRequest {
    pub id: String,
    pub user_id: String,
    /// Denormalized for display on the review screen
    pub username: String,
    pub amount: u32,
    pub reason: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// All credit requests, keyed by id, with submission order tracked.
///
/// Resolution holds the request's DashMap entry guard across both the
/// ledger credit and the status flip, so concurrent approve/deny calls on
/// the same request serialize and the second one sees `AlreadyResolved`.
#[derive(Debug, Default)]
pub struct CreditRequestBook {
    requests: DashMap<String, CreditRequest>,
    order: Mutex<Vec<String>>,
}

impl CreditRequestBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a new pending request on behalf of `user_id`.
    pub fn submit(
        &self,
        ledger: &CreditLedger,
        user_id: &str,
        amount: u32,
        reason: &str,
    ) -> Result<CreditRequest, ScanError> {
        if amount == 0 {
            return Err(ScanError::InvalidAmount);
        }
        let user = ledger
            .get(user_id)
            .ok_or_else(|| ScanError::UnknownUser(user_id.to_string()))?;

        let request = CreditRequest {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id,
            username: user.username,
            amount,
            reason: reason.to_string(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        };
        self.requests.insert(request.id.clone(), request.clone());
        self.order.lock().unwrap().push(request.id.clone());
        Ok(request)
    }

    /// Approve a pending request, crediting the requester's balance by the
    /// requested amount. The credit is applied before the status flips, so
    /// no approved-but-uncredited state is ever observable.
    pub fn approve(
        &self,
        ledger: &CreditLedger,
        request_id: &str,
    ) -> Result<CreditRequest, ScanError> {
        let mut entry = self
            .requests
            .get_mut(request_id)
            .ok_or_else(|| ScanError::NotFound(request_id.to_string()))?;
        if entry.status != RequestStatus::Pending {
            return Err(ScanError::AlreadyResolved(request_id.to_string()));
        }

        ledger.grant_credits(&entry.user_id, entry.amount)?;
        entry.status = RequestStatus::Approved;
        Ok(entry.clone())
    }

    /// Deny a pending request. No ledger interaction.
    pub fn deny(&self, request_id: &str) -> Result<CreditRequest, ScanError> {
        let mut entry = self
            .requests
            .get_mut(request_id)
            .ok_or_else(|| ScanError::NotFound(request_id.to_string()))?;
        if entry.status != RequestStatus::Pending {
            return Err(ScanError::AlreadyResolved(request_id.to_string()));
        }

        entry.status = RequestStatus::Denied;
        Ok(entry.clone())
    }

    /// Requests filed by one user, in submission order.
    pub fn for_user(&self, user_id: &str) -> Vec<CreditRequest> {
        let order = self.order.lock().unwrap();
        order
            .iter()
            .filter_map(|id| self.requests.get(id).map(|r| r.clone()))
            .filter(|r| r.user_id == user_id)
            .collect()
    }

    /// Every request, in submission order.
    pub fn all(&self) -> Vec<CreditRequest> {
        let order = self.order.lock().unwrap();
        order
            .iter()
            .filter_map(|id| self.requests.get(id).map(|r| r.clone()))
            .collect()
    }
}
