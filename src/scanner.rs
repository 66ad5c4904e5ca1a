//! Orchestration facade tying the quota ledger, document store, similarity
//! backend, request workflow and analytics together.

use crate::analytics::{self, AnalyticsReport};
use crate::error::ScanError;
use crate::ledger::{CreditLedger, Role, User};
use crate::requests::{CreditRequest, CreditRequestBook};
use crate::similarity::{EditDistanceBackend, ScanResult, SimilarityBackend};
use crate::store::{Document, DocumentStore};

/// Outcome of a scan submission.
#[derive(Debug)]
pub enum ScanOutcome {
    /// Quota spent, document stored, matches ranked
    Ranked(Vec<ScanResult>),
    /// Recoverable quota/identity failure; nothing was stored
    Rejected(ScanError),
}

/// The core engine: one instance per process (or per test).
pub struct ScanEngine {
    store: DocumentStore,
    ledger: CreditLedger,
    requests: CreditRequestBook,
    backend: Box<dyn SimilarityBackend>,
    threshold: f64,
}

impl ScanEngine {
    /// Engine with the deterministic edit-distance backend.
    pub fn new(threshold: f64) -> Self {
        Self::with_backend(Box::new(EditDistanceBackend), threshold)
    }

    pub fn with_backend(backend: Box<dyn SimilarityBackend>, threshold: f64) -> Self {
        Self {
            store: DocumentStore::new(),
            ledger: CreditLedger::new(),
            requests: CreditRequestBook::new(),
            backend,
            threshold,
        }
    }

    /// Submit a document for scanning.
    ///
    /// Deducts one credit first; only on success is the document stored and
    /// ranked against the corpus as it existed before this submission, so a
    /// scan never matches its own document. A backend failure after the
    /// deduction is an infrastructure error: the credit stays spent and the
    /// document stays stored.
    pub fn scan(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
    ) -> anyhow::Result<ScanOutcome> {
        if let Err(e) = self.ledger.authorize_and_deduct(user_id) {
            return Ok(ScanOutcome::Rejected(e));
        }

        let corpus = self.store.all();
        self.store.add(user_id, title, content);

        let results = self.backend.rank(content, &corpus, self.threshold)?;
        eprintln!(
            "[scan] user={} corpus={} matches={}",
            user_id,
            corpus.len(),
            results.len()
        );
        Ok(ScanOutcome::Ranked(results))
    }

    /// Documents owned by a user, newest first.
    pub fn documents_for(&self, user_id: &str) -> Vec<Document> {
        let mut docs = self.store.for_user(user_id);
        docs.reverse();
        docs
    }

    pub fn document_count(&self) -> usize {
        self.store.len()
    }

    // User registry passthroughs. The ledger is the sole owner of user
    // records; the engine only routes.

    pub fn register_user(&self, username: &str, role: Role) -> User {
        self.ledger.register(username, role)
    }

    pub fn seed_user(&self, user: User) {
        self.ledger.insert(user);
    }

    pub fn user(&self, user_id: &str) -> Option<User> {
        self.ledger.get(user_id)
    }

    pub fn user_by_name(&self, username: &str) -> Option<User> {
        self.ledger.find_by_username(username)
    }

    pub fn refresh_user(&self, user_id: &str) -> Result<User, ScanError> {
        self.ledger.refresh(user_id)
    }

    pub fn user_count(&self) -> usize {
        self.ledger.user_count()
    }

    // Credit request workflow.

    pub fn submit_request(
        &self,
        user_id: &str,
        amount: u32,
        reason: &str,
    ) -> Result<CreditRequest, ScanError> {
        self.requests.submit(&self.ledger, user_id, amount, reason)
    }

    pub fn approve_request(&self, request_id: &str) -> Result<CreditRequest, ScanError> {
        self.requests.approve(&self.ledger, request_id)
    }

    pub fn deny_request(&self, request_id: &str) -> Result<CreditRequest, ScanError> {
        self.requests.deny(request_id)
    }

    pub fn requests_for(&self, user_id: &str) -> Vec<CreditRequest> {
        self.requests.for_user(user_id)
    }

    pub fn all_requests(&self) -> Vec<CreditRequest> {
        self.requests.all()
    }

    /// Usage report for the admin dashboard.
    pub fn report(&self) -> AnalyticsReport {
        analytics::generate_report(&self.store, &self.ledger)
    }
}
