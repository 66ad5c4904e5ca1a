//! Term-frequency topic analysis over the corpus.

use crate::store::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Tokens shorter than this carry no topical signal.
const MIN_TOKEN_LEN: usize = 3;

/// English stop words: articles, conjunctions, common prepositions,
/// auxiliary verbs and pronouns.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "with", "by",
        "about", "as", "of", "from", "is", "are", "was", "were", "be", "been", "being", "have",
        "has", "had", "do", "does", "did", "will", "would", "shall", "should", "can", "could",
        "may", "might", "must", "this", "that", "these", "those", "i", "you", "he", "she", "it",
        "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our",
        "their",
    ]
    .into_iter()
    .collect()
});

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Count topic occurrences across the whole corpus.
///
/// Content is lower-cased, punctuation stripped, and tokenized on
/// whitespace; short tokens and stop words are dropped. The returned pairs
/// are in first-encounter order so downstream top-N tie-breaks are
/// deterministic.
pub fn analyze_topics(corpus: &[Document]) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut topics: Vec<(String, u64)> = Vec::new();

    for doc in corpus {
        let lowered = doc.content.to_lowercase();
        let cleaned = NON_WORD_RE.replace_all(&lowered, "");
        for token in cleaned.split_whitespace() {
            if token.chars().count() < MIN_TOKEN_LEN || STOP_WORDS.contains(token) {
                continue;
            }
            match counts.get(token) {
                Some(&idx) => topics[idx].1 += 1,
                None => {
                    counts.insert(token.to_string(), topics.len());
                    topics.push((token.to_string(), 1));
                }
            }
        }
    }

    topics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentStore;

    fn corpus_of(contents: &[&str]) -> Vec<Document> {
        let store = DocumentStore::new();
        for (i, c) in contents.iter().enumerate() {
            store.add("u1", &format!("doc-{}", i), c);
        }
        store.all()
    }

    #[test]
    fn test_stop_words_and_short_tokens_dropped() {
        let corpus = corpus_of(&["The Cat sat on the Mat"]);
        let topics = analyze_topics(&corpus);

        assert_eq!(
            topics,
            vec![
                ("cat".to_string(), 1),
                ("sat".to_string(), 1),
                ("mat".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_counts_aggregate_across_documents() {
        let corpus = corpus_of(&["rust programs", "rust compilers compile rust"]);
        let topics = analyze_topics(&corpus);

        assert_eq!(topics[0], ("rust".to_string(), 3));
        // First-encounter order: rust, programs, compilers, compile
        assert_eq!(topics[1].0, "programs");
        assert_eq!(topics[2].0, "compilers");
        assert_eq!(topics[3].0, "compile");
    }

    #[test]
    fn test_punctuation_stripped_and_case_folded() {
        let corpus = corpus_of(&["Hello, HELLO! (hello)"]);
        let topics = analyze_topics(&corpus);
        assert_eq!(topics, vec![("hello".to_string(), 3)]);
    }

    #[test]
    fn test_two_char_tokens_dropped() {
        let corpus = corpus_of(&["go is ok but rust endures"]);
        let topics = analyze_topics(&corpus);
        let names: Vec<&str> = topics.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(names, vec!["rust", "endures"]);
    }

    #[test]
    fn test_empty_corpus() {
        assert!(analyze_topics(&[]).is_empty());
    }
}
