//! Aggregate usage reporting for the admin dashboard.

use crate::ledger::{CreditLedger, DAILY_ALLOTMENT};
use crate::store::DocumentStore;
use crate::topics;
use serde::{Deserialize, Serialize};

/// One row of the top-scanners table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserScans {
    pub username: String,
    pub scans_today: u32,
}

/// One row of the credit-consumption table.
///
/// Consumption is `allotment - balance`, which goes negative when a grant
/// pushes a balance above the daily allotment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditUsage {
    pub username: String,
    pub credits_used: i64,
}

/// One row of the top-topics table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: u64,
}

/// Snapshot of current usage. Recomputed from live component state on
/// every call; nothing here is cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub total_users: usize,
    pub total_documents: usize,
    pub total_scans_today: u64,
    /// Top 5 by scans today; ties keep registration order
    pub top_users: Vec<UserScans>,
    /// Non-admin accounts only, most-consumed first
    pub credit_usage: Vec<CreditUsage>,
    /// Top 10 by occurrence; ties keep first-encounter order
    pub top_topics: Vec<TopicCount>,
}

/// Build the usage report from the current store and ledger state.
pub fn generate_report(store: &DocumentStore, ledger: &CreditLedger) -> AnalyticsReport {
    let users = ledger.all_users();
    let corpus = store.all();

    let total_scans_today = users.iter().map(|u| u64::from(u.scans_today)).sum();

    let mut top_users: Vec<UserScans> = users
        .iter()
        .map(|u| UserScans {
            username: u.username.clone(),
            scans_today: u.scans_today,
        })
        .collect();
    top_users.sort_by(|a, b| b.scans_today.cmp(&a.scans_today));
    top_users.truncate(5);

    let mut credit_usage: Vec<CreditUsage> = users
        .iter()
        .filter(|u| !u.is_admin())
        .map(|u| CreditUsage {
            username: u.username.clone(),
            credits_used: i64::from(DAILY_ALLOTMENT) - i64::from(u.credits),
        })
        .collect();
    credit_usage.sort_by(|a, b| b.credits_used.cmp(&a.credits_used));

    let mut top_topics: Vec<TopicCount> = topics::analyze_topics(&corpus)
        .into_iter()
        .map(|(topic, count)| TopicCount { topic, count })
        .collect();
    top_topics.sort_by(|a, b| b.count.cmp(&a.count));
    top_topics.truncate(10);

    AnalyticsReport {
        total_users: users.len(),
        total_documents: corpus.len(),
        total_scans_today,
        top_users,
        credit_usage,
        top_topics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Role;

    fn scan_n(ledger: &CreditLedger, user_id: &str, n: u32) {
        for _ in 0..n {
            ledger.authorize_and_deduct(user_id).unwrap();
        }
    }

    #[test]
    fn test_totals_and_scan_sum() {
        let store = DocumentStore::new();
        let ledger = CreditLedger::new();
        let a = ledger.register("alice", Role::User);
        let b = ledger.register("bob", Role::User);
        scan_n(&ledger, &a.id, 3);
        scan_n(&ledger, &b.id, 2);
        store.add(&a.id, "One", "rust ownership model");

        let report = generate_report(&store, &ledger);
        assert_eq!(report.total_users, 2);
        assert_eq!(report.total_documents, 1);
        assert_eq!(report.total_scans_today, 5);
    }

    #[test]
    fn test_top_users_capped_at_five_with_stable_ties() {
        let store = DocumentStore::new();
        let ledger = CreditLedger::new();
        let names = ["u1", "u2", "u3", "u4", "u5", "u6"];
        for name in names {
            let u = ledger.register(name, Role::User);
            scan_n(&ledger, &u.id, 1);
        }

        let report = generate_report(&store, &ledger);
        assert_eq!(report.top_users.len(), 5);
        // All tied at 1 scan, so registration order wins
        let listed: Vec<&str> = report.top_users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(listed, vec!["u1", "u2", "u3", "u4", "u5"]);
    }

    #[test]
    fn test_credit_usage_excludes_admins_and_sorts_descending() {
        let store = DocumentStore::new();
        let ledger = CreditLedger::new();
        let admin = ledger.register("root", Role::Admin);
        let a = ledger.register("alice", Role::User);
        let b = ledger.register("bob", Role::User);
        scan_n(&ledger, &admin.id, 5);
        scan_n(&ledger, &a.id, 2);
        scan_n(&ledger, &b.id, 7);

        let report = generate_report(&store, &ledger);
        let rows: Vec<(&str, i64)> = report
            .credit_usage
            .iter()
            .map(|c| (c.username.as_str(), c.credits_used))
            .collect();
        assert_eq!(rows, vec![("bob", 7), ("alice", 2)]);
    }

    #[test]
    fn test_credit_usage_negative_after_grant() {
        let store = DocumentStore::new();
        let ledger = CreditLedger::new();
        let a = ledger.register("alice", Role::User);
        ledger.grant_credits(&a.id, 10).unwrap();

        let report = generate_report(&store, &ledger);
        assert_eq!(report.credit_usage[0].credits_used, -10);
    }

    #[test]
    fn test_top_topics_capped_and_ordered() {
        let store = DocumentStore::new();
        let ledger = CreditLedger::new();
        let a = ledger.register("alice", Role::User);
        store.add(&a.id, "One", "rust rust rust parser parser lexer");

        let report = generate_report(&store, &ledger);
        let rows: Vec<(&str, u64)> = report
            .top_topics
            .iter()
            .map(|t| (t.topic.as_str(), t.count))
            .collect();
        assert_eq!(rows, vec![("rust", 3), ("parser", 2), ("lexer", 1)]);
    }
}
