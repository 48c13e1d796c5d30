//! Triples: subject-predicate-object relations between entities

use super::entity::EntityId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a triple
///
/// Assigned once when the triple is created and never derived from content,
/// since both the predicate and the endpoints of a triple can change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripleId(String);

impl TripleId {
    /// Create a new random TripleId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a TripleId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TripleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TripleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A relation type, looked up in its own search namespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub url: String,
    #[serde(default, alias = "text")]
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Predicate {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Content key of a triple: `(subject, predicate url, object)`
pub type TripleKey<'a> = (&'a EntityId, Option<&'a str>, &'a EntityId);

/// A relation between two entities of the same graph
///
/// Endpoints are entity ids resolved against the owning graph, so an entity
/// updated once is seen through every triple that references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    #[serde(default)]
    pub id: TripleId,
    pub subject: EntityId,
    /// `None` while the user is still choosing a predicate
    #[serde(default)]
    pub predicate: Option<Predicate>,
    pub object: EntityId,
}

impl Triple {
    pub fn new(subject: EntityId, predicate: Option<Predicate>, object: EntityId) -> Self {
        Self {
            id: TripleId::new(),
            subject,
            predicate,
            object,
        }
    }

    pub fn with_id(mut self, id: TripleId) -> Self {
        self.id = id;
        self
    }

    pub fn predicate_url(&self) -> Option<&str> {
        self.predicate.as_ref().map(|p| p.url.as_str())
    }

    pub fn key(&self) -> TripleKey<'_> {
        (&self.subject, self.predicate_url(), &self.object)
    }

    /// Same subject and object, regardless of predicate
    pub fn connects(&self, subject: &EntityId, object: &EntityId) -> bool {
        self.subject == *subject && self.object == *object
    }

    pub fn references(&self, entity: &EntityId) -> bool {
        self.subject == *entity || self.object == *entity
    }
}
