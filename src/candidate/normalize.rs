//! Normalization of raw search records into engine candidates

use crate::graph::{Entity, EntityId, Predicate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A canonical entity (or property) proposed by the search backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Always populated; taken from `url`, falling back to `id`
    pub url: EntityId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Backend frequency, when reported
    #[serde(default)]
    pub score: Option<f64>,
    /// The query text this candidate was found for
    #[serde(default)]
    pub text: String,
}

impl Candidate {
    pub fn new(url: impl Into<EntityId>, label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            url: url.into(),
            text: label.clone(),
            label,
            description: None,
            score: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A fresh entity carrying this candidate's fields and no mentions
    pub fn to_entity(&self) -> Entity {
        Entity {
            url: self.url.clone(),
            label: (!self.label.is_empty()).then(|| self.label.clone()),
            description: self.description.clone(),
            score: self.score,
            mentions: Vec::new(),
        }
    }

    /// Interpret this candidate as a predicate from the property namespace
    pub fn into_predicate(self) -> Predicate {
        Predicate {
            url: self.url.as_str().to_string(),
            label: self.label,
            description: self.description,
        }
    }
}

fn string_field(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(record: &Value, field: &str) -> Option<f64> {
    match record.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Normalize one raw search record.
///
/// Returns `None` when the record carries neither `url` nor `id`.
pub fn normalize_record(query: &str, record: &Value) -> Option<Candidate> {
    let url = string_field(record, "url").or_else(|| string_field(record, "id"))?;
    Some(Candidate {
        url: EntityId::from(url),
        label: string_field(record, "label").unwrap_or_default(),
        description: string_field(record, "description"),
        score: number_field(record, "frequency").or_else(|| number_field(record, "score")),
        text: query.to_string(),
    })
}

/// Normalize a raw result list, preserving backend order and dropping
/// records without any identifier.
pub fn normalize_results(query: &str, records: &[Value]) -> Vec<Candidate> {
    records
        .iter()
        .filter_map(|record| normalize_record(query, record))
        .collect()
}
