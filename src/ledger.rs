//! Per-user credit balances and the daily reset lifecycle.
//!
//! The ledger is the only component that mutates `User` records. Every
//! operation applies the lazy calendar-day reset guard before touching a
//! balance, so a user who was last seen yesterday gets exactly one reset
//! on the next touch, whichever operation that happens to be.

use crate::error::ScanError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Credits a non-admin account holds after a daily reset.
pub const DAILY_ALLOTMENT: u32 = 20;

/// Account privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

/// A registered account with its quota state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    /// Remaining scan credits; never negative
    pub credits: u32,
    /// Scans performed since the last daily reset
    pub scans_today: u32,
    /// When the daily reset last ran for this account
    pub last_reset: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Registry of users and their credit balances.
///
/// Mutations take the DashMap entry guard for the whole read-modify-write,
/// which serializes ledger operations per user.
#[derive(Debug, Default)]
pub struct CreditLedger {
    users: DashMap<String, User>,
    /// User ids in registration order; analytics tie-breaks depend on it
    order: Mutex<Vec<String>>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account with the standard daily allotment.
    pub fn register(&self, username: &str, role: Role) -> User {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            role,
            credits: DAILY_ALLOTMENT,
            scans_today: 0,
            last_reset: Utc::now(),
        };
        self.users.insert(user.id.clone(), user.clone());
        self.order.lock().unwrap().push(user.id.clone());
        user
    }

    /// Insert a pre-built account, e.g. the seeded fixture users.
    pub fn insert(&self, user: User) {
        self.order.lock().unwrap().push(user.id.clone());
        self.users.insert(user.id.clone(), user);
    }

    pub fn get(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let order = self.order.lock().unwrap();
        order
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .find(|u| u.username == username)
    }

    /// All users in registration order.
    pub fn all_users(&self) -> Vec<User> {
        let order = self.order.lock().unwrap();
        order
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Spend one credit for a scan. Applies the reset guard first; fails
    /// with `InsufficientCredits` and no mutation if the (post-reset)
    /// balance is zero.
    pub fn authorize_and_deduct(&self, user_id: &str) -> Result<User, ScanError> {
        let mut entry = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| ScanError::UnknownUser(user_id.to_string()))?;

        reset_if_new_day(&mut entry, Utc::now());
        if entry.credits == 0 {
            return Err(ScanError::InsufficientCredits);
        }
        entry.credits -= 1;
        entry.scans_today += 1;
        Ok(entry.clone())
    }

    /// Add credits to a balance. Scan count and reset stamp are untouched;
    /// callers guarantee `amount > 0`. The balance saturates at `u32::MAX`
    /// rather than wrapping on an oversized grant.
    pub fn grant_credits(&self, user_id: &str, amount: u32) -> Result<User, ScanError> {
        let mut entry = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| ScanError::UnknownUser(user_id.to_string()))?;
        entry.credits = entry.credits.saturating_add(amount);
        Ok(entry.clone())
    }

    /// Apply only the reset guard and return the current record, so a
    /// displayed balance can be re-synchronized after external mutation.
    pub fn refresh(&self, user_id: &str) -> Result<User, ScanError> {
        let mut entry = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| ScanError::UnknownUser(user_id.to_string()))?;
        reset_if_new_day(&mut entry, Utc::now());
        Ok(entry.clone())
    }
}

/// Lazy daily reset: on the first touch of a new UTC calendar day, restore
/// a non-admin balance to the daily allotment (admin balances are never
/// reduced) and clear the scan count.
fn reset_if_new_day(user: &mut User, now: DateTime<Utc>) {
    if user.last_reset.date_naive() == now.date_naive() {
        return;
    }
    if !user.is_admin() {
        user.credits = DAILY_ALLOTMENT;
    }
    user.scans_today = 0;
    user.last_reset = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn backdate(ledger: &CreditLedger, user_id: &str, days: i64) {
        let mut entry = ledger.users.get_mut(user_id).unwrap();
        entry.last_reset = entry.last_reset - Duration::days(days);
    }

    #[test]
    fn test_register_starts_with_allotment() {
        let ledger = CreditLedger::new();
        let user = ledger.register("alice", Role::User);

        assert_eq!(user.credits, DAILY_ALLOTMENT);
        assert_eq!(user.scans_today, 0);
        assert_eq!(user.last_reset.date_naive(), Utc::now().date_naive());
    }

    #[test]
    fn test_deduct_until_exhausted() {
        let ledger = CreditLedger::new();
        let user = ledger.register("alice", Role::User);

        for i in 0..DAILY_ALLOTMENT {
            let updated = ledger.authorize_and_deduct(&user.id).unwrap();
            assert_eq!(updated.credits, DAILY_ALLOTMENT - 1 - i);
            assert_eq!(updated.scans_today, i + 1);
        }

        let err = ledger.authorize_and_deduct(&user.id).unwrap_err();
        assert_eq!(err, ScanError::InsufficientCredits);
        // Failure leaves the record untouched
        let after = ledger.get(&user.id).unwrap();
        assert_eq!(after.credits, 0);
        assert_eq!(after.scans_today, DAILY_ALLOTMENT);
    }

    #[test]
    fn test_deduct_unknown_user() {
        let ledger = CreditLedger::new();
        let err = ledger.authorize_and_deduct("nope").unwrap_err();
        assert_eq!(err, ScanError::UnknownUser("nope".to_string()));
    }

    #[test]
    fn test_reset_restores_non_admin_allotment() {
        let ledger = CreditLedger::new();
        let user = ledger.register("alice", Role::User);

        // Spend a few, then pretend the last reset was yesterday
        ledger.authorize_and_deduct(&user.id).unwrap();
        ledger.authorize_and_deduct(&user.id).unwrap();
        backdate(&ledger, &user.id, 1);

        let refreshed = ledger.refresh(&user.id).unwrap();
        assert_eq!(refreshed.credits, DAILY_ALLOTMENT);
        assert_eq!(refreshed.scans_today, 0);
        assert_eq!(refreshed.last_reset.date_naive(), Utc::now().date_naive());
    }

    #[test]
    fn test_reset_leaves_admin_balance_untouched() {
        let ledger = CreditLedger::new();
        let mut admin = ledger.register("root", Role::Admin);
        admin = ledger.grant_credits(&admin.id, 979).unwrap();
        assert_eq!(admin.credits, 999);

        backdate(&ledger, &admin.id, 1);
        // Next deduction first runs the reset, which must not touch the
        // admin balance, then spends one credit
        let after = ledger.authorize_and_deduct(&admin.id).unwrap();
        assert_eq!(after.credits, 998);
        assert_eq!(after.scans_today, 1);
    }

    #[test]
    fn test_reset_happens_once_per_day_boundary() {
        let ledger = CreditLedger::new();
        let user = ledger.register("alice", Role::User);
        backdate(&ledger, &user.id, 3);

        let first = ledger.refresh(&user.id).unwrap();
        assert_eq!(first.credits, DAILY_ALLOTMENT);

        // Spend one; a second touch on the same day must not reset again
        ledger.authorize_and_deduct(&user.id).unwrap();
        let second = ledger.refresh(&user.id).unwrap();
        assert_eq!(second.credits, DAILY_ALLOTMENT - 1);
        assert_eq!(second.scans_today, 1);
    }

    #[test]
    fn test_grant_credits_ignores_scan_state() {
        let ledger = CreditLedger::new();
        let user = ledger.register("alice", Role::User);
        ledger.authorize_and_deduct(&user.id).unwrap();

        let before = ledger.get(&user.id).unwrap();
        let granted = ledger.grant_credits(&user.id, 5).unwrap();
        assert_eq!(granted.credits, before.credits + 5);
        assert_eq!(granted.scans_today, before.scans_today);
        assert_eq!(granted.last_reset, before.last_reset);
    }

    #[test]
    fn test_grant_near_max_saturates_instead_of_wrapping() {
        let ledger = CreditLedger::new();
        let user = ledger.register("alice", Role::User);
        assert_eq!(user.credits, DAILY_ALLOTMENT);

        // An oversized grant must never wrap the balance around zero
        let granted = ledger.grant_credits(&user.id, u32::MAX).unwrap();
        assert_eq!(granted.credits, u32::MAX);

        // A follow-up grant on a saturated balance stays saturated
        let granted = ledger.grant_credits(&user.id, 5).unwrap();
        assert_eq!(granted.credits, u32::MAX);
    }

    #[test]
    fn test_all_users_in_registration_order() {
        let ledger = CreditLedger::new();
        ledger.register("alice", Role::User);
        ledger.register("bob", Role::User);
        ledger.register("carol", Role::Admin);

        let names: Vec<String> = ledger.all_users().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
        assert_eq!(ledger.user_count(), 3);
    }

    #[test]
    fn test_find_by_username() {
        let ledger = CreditLedger::new();
        let alice = ledger.register("alice", Role::User);
        assert_eq!(ledger.find_by_username("alice").unwrap().id, alice.id);
        assert!(ledger.find_by_username("bob").is_none());
    }
}
