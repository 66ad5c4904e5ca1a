//! In-memory document repository.
//!
//! Documents are immutable once inserted and kept in insertion order; the
//! similarity ranking's tie-break and the analytics totals both depend on
//! that order being stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// A submitted document. Never mutated or deleted after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Immutable identifier
    pub id: String,
    /// Owning user id
    pub user_id: String,
    /// Display title
    pub title: String,
    /// Full text content
    pub content: String,
    /// Submission timestamp
    pub created_at: DateTime<Utc>,
}

/// Owned repository for the shared corpus.
///
/// One instance per process (or per test); replaces any notion of an
/// ambient global collection.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: RwLock<Vec<Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new document and return it.
    pub fn add(&self, user_id: &str, title: &str, content: &str) -> Document {
        let doc = Document {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let mut docs = self.docs.write().unwrap();
        docs.push(doc.clone());
        doc
    }

    /// Look up a document by id.
    pub fn get(&self, document_id: &str) -> Option<Document> {
        let docs = self.docs.read().unwrap();
        docs.iter().find(|d| d.id == document_id).cloned()
    }

    /// Documents owned by a user, in insertion order.
    pub fn for_user(&self, user_id: &str) -> Vec<Document> {
        let docs = self.docs.read().unwrap();
        docs.iter().filter(|d| d.user_id == user_id).cloned().collect()
    }

    /// Snapshot of the entire corpus, in insertion order.
    pub fn all(&self) -> Vec<Document> {
        let docs = self.docs.read().unwrap();
        docs.clone()
    }

    /// Number of documents in the corpus.
    pub fn len(&self) -> usize {
        let docs = self.docs.read().unwrap();
        docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let store = DocumentStore::new();
        let doc = store.add("u1", "First", "hello world");

        let found = store.get(&doc.id).unwrap();
        assert_eq!(found.title, "First");
        assert_eq!(found.content, "hello world");
        assert_eq!(found.user_id, "u1");
    }

    #[test]
    fn test_for_user_filters_by_owner() {
        let store = DocumentStore::new();
        store.add("u1", "A", "aaa");
        store.add("u2", "B", "bbb");
        store.add("u1", "C", "ccc");

        let mine = store.for_user("u1");
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].title, "A");
        assert_eq!(mine[1].title, "C");
    }

    #[test]
    fn test_all_preserves_insertion_order() {
        let store = DocumentStore::new();
        store.add("u1", "A", "aaa");
        store.add("u1", "B", "bbb");

        let all = store.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "A");
        assert_eq!(all[1].title, "B");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = DocumentStore::new();
        assert!(store.get("nope").is_none());
        assert!(store.is_empty());
    }
}
