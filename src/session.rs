//! DocumentStore: open documents and their current graphs
//!
//! Each document holds the latest committed graph. Edits are applied
//! atomically per document: the reconciler runs against the stored graph,
//! and on success the new graph replaces it and the view delta is returned.

use crate::graph::KnowledgeGraph;
use crate::reconcile::{Change, Edit, ReconcileError, Reconciler};
use crate::view::{project_delta, ViewOp};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an open document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error(transparent)]
    Rejected(#[from] ReconcileError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// An open document
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub kg: KnowledgeGraph,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of committed edits that changed the graph
    pub revision: u64,
}

impl Document {
    pub fn new(name: impl Into<String>, kg: KnowledgeGraph) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            name: name.into(),
            kg,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }
}

/// What one committed edit did
#[derive(Debug, Clone, Serialize)]
pub struct Applied {
    pub change: Change,
    pub ops: Vec<ViewOp>,
    pub revision: u64,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<DocumentId, Document>,
    reconciler: Reconciler,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconciler(reconciler: Reconciler) -> Self {
        Self {
            documents: DashMap::new(),
            reconciler,
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Register a document, replacing any document with the same id.
    pub fn open(&self, document: Document) -> DocumentId {
        let id = document.id.clone();
        tracing::info!(document = %id, name = %document.name, entities = document.kg.entity_count(), "opened document");
        self.documents.insert(id.clone(), document);
        id
    }

    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        self.documents.get(id).map(|r| r.clone())
    }

    /// Snapshot of a document's current graph
    pub fn graph(&self, id: &DocumentId) -> Option<KnowledgeGraph> {
        self.documents.get(id).map(|r| r.kg.clone())
    }

    pub fn close(&self, id: &DocumentId) -> Option<Document> {
        self.documents.remove(id).map(|(_, doc)| doc)
    }

    pub fn list(&self) -> Vec<DocumentId> {
        self.documents.iter().map(|r| r.key().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.contains_key(id)
    }

    /// Apply one edit to the stored graph and return the view delta.
    ///
    /// The document's entry is held for the whole edit, so concurrent edits
    /// to the same document serialize. A rejected edit leaves the stored
    /// graph and revision untouched; an edit whose target does not exist
    /// succeeds as unchanged.
    pub fn apply(&self, id: &DocumentId, edit: &Edit) -> SessionResult<Applied> {
        let mut doc = self
            .documents
            .get_mut(id)
            .ok_or_else(|| SessionError::DocumentNotFound(id.clone()))?;

        let outcome = self.reconciler.apply(&doc.kg, edit);
        match outcome.error {
            // A missing target is a no-op, not a failure.
            Some(ReconcileError::NotFound(what)) => {
                tracing::debug!(document = %id, %what, "edit target not found");
            }
            Some(error) => return Err(error.into()),
            None => {}
        }
        if outcome.change.is_unchanged() {
            return Ok(Applied {
                change: outcome.change,
                ops: Vec::new(),
                revision: doc.revision,
            });
        }

        let ops = project_delta(&doc.kg, &outcome.kg, &outcome.change);
        doc.kg = outcome.kg;
        doc.updated_at = Utc::now();
        doc.revision += 1;
        tracing::debug!(document = %id, kind = outcome.change.kind(), revision = doc.revision, "committed edit");

        Ok(Applied {
            change: outcome.change,
            ops,
            revision: doc.revision,
        })
    }
}
