//! Candidate sources: read-only lookups keyed by free-text query

use super::normalize::{normalize_results, Candidate};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Which search namespace a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchNamespace {
    /// Canonical entities
    Entity,
    /// Relation properties
    Predicate,
}

impl std::fmt::Display for SearchNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity => write!(f, "entity"),
            Self::Predicate => write!(f, "predicate"),
        }
    }
}

/// Errors from a search backend
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search backend unavailable: {0}")]
    Unavailable(String),
    #[error("malformed search response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The interface to an external search backend.
///
/// Implementations return raw records `{id, label, description, frequency}`
/// in backend order; normalization happens in [`resolve`].
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn search(&self, namespace: SearchNamespace, query: &str) -> Result<Vec<Value>, SearchError>;
}

/// Query a source and normalize its records into candidates
pub async fn resolve(
    source: &dyn CandidateSource,
    namespace: SearchNamespace,
    query: &str,
) -> Result<Vec<Candidate>, SearchError> {
    let records = source.search(namespace, query).await?;
    let candidates = normalize_results(query, &records);
    tracing::debug!(
        %namespace,
        query,
        records = records.len(),
        candidates = candidates.len(),
        "resolved search candidates"
    );
    Ok(candidates)
}

/// In-memory source matching queries against record labels
/// (case-insensitive substring), in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: HashMap<SearchNamespace, Vec<Value>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, namespace: SearchNamespace, record: Value) -> Self {
        self.records.entry(namespace).or_default().push(record);
        self
    }

    /// Load records from a JSON array
    pub fn with_records_json(mut self, namespace: SearchNamespace, json: &str) -> Result<Self, SearchError> {
        let records: Vec<Value> = serde_json::from_str(json)?;
        self.records.entry(namespace).or_default().extend(records);
        Ok(self)
    }
}

#[async_trait]
impl CandidateSource for InMemorySource {
    async fn search(&self, namespace: SearchNamespace, query: &str) -> Result<Vec<Value>, SearchError> {
        let needle = query.to_lowercase();
        Ok(self
            .records
            .get(&namespace)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| {
                        r.get("label")
                            .and_then(Value::as_str)
                            .map(|label| label.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
