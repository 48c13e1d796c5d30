//! Last-request-wins bookkeeping for outstanding searches
//!
//! Each UI target (a text span, a graph node, a triple's predicate field) can
//! have several searches in flight. Only the most recently started one may
//! deliver results; older responses are discarded on arrival.

use super::normalize::Candidate;
use super::source::{resolve, CandidateSource, SearchError, SearchNamespace};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle for one started search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub target: String,
    seq: u64,
}

/// Tracks the newest search per UI target.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SearchTracker {
    latest: Arc<DashMap<String, u64>>,
    counter: Arc<AtomicU64>,
}

impl SearchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a search for `target`, superseding any earlier one.
    pub fn begin(&self, target: impl Into<String>) -> SearchTicket {
        let target = target.into();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.latest.insert(target.clone(), seq);
        SearchTicket { target, seq }
    }

    /// True if no newer search has started for the ticket's target.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.latest
            .get(&ticket.target)
            .map(|seq| *seq == ticket.seq)
            .unwrap_or(false)
    }

    /// Hand back `results` only if the ticket is still current.
    pub fn accept<T>(&self, ticket: &SearchTicket, results: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(results)
        } else {
            tracing::debug!(target_id = %ticket.target, "discarding superseded search response");
            None
        }
    }

    /// Run a search for `target`; `Ok(None)` if it was superseded while in flight.
    pub async fn search(
        &self,
        source: &dyn CandidateSource,
        target: impl Into<String>,
        namespace: SearchNamespace,
        query: &str,
    ) -> Result<Option<Vec<Candidate>>, SearchError> {
        let ticket = self.begin(target);
        let candidates = resolve(source, namespace, query).await?;
        Ok(self.accept(&ticket, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::InMemorySource;
    use serde_json::json;

    #[test]
    fn newer_ticket_supersedes_older() {
        let tracker = SearchTracker::new();
        let first = tracker.begin("span:0:5");
        let second = tracker.begin("span:0:5");

        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
        assert_eq!(tracker.accept(&first, 1), None);
        assert_eq!(tracker.accept(&second, 2), Some(2));
    }

    #[test]
    fn targets_are_independent() {
        let tracker = SearchTracker::new();
        let span = tracker.begin("span:0:5");
        let node = tracker.begin("node:Q1");
        assert!(tracker.is_current(&span));
        assert!(tracker.is_current(&node));
    }

    #[test]
    fn cloned_tracker_shares_state() {
        let tracker = SearchTracker::new();
        let clone = tracker.clone();
        let ticket = tracker.begin("t");
        clone.begin("t");
        assert!(!tracker.is_current(&ticket));
    }

    #[tokio::test]
    async fn search_returns_current_results() {
        let source = InMemorySource::new()
            .with_record(SearchNamespace::Entity, json!({"id": "Q90", "label": "Paris"}));
        let tracker = SearchTracker::new();
        let results = tracker
            .search(&source, "span:0:5", SearchNamespace::Entity, "paris")
            .await
            .unwrap();
        assert_eq!(results.map(|c| c.len()), Some(1));
    }
}
