//! Reconciliation engine
//!
//! Pure operations over a [`KnowledgeGraph`](crate::graph::KnowledgeGraph):
//! each takes the current graph and one user edit and returns the next graph
//! together with a [`Change`] descriptor. Entity identity, mention ownership
//! and triple referential integrity hold before and after every call.

mod change;
mod engine;

pub use change::{Change, Outcome, ReconcileError, ReconcileResult, Relink};
pub use engine::{Edit, Reconciler, DEFAULT_LITERAL_NAMESPACE};

use crate::graph::{EntityId, MentionKey};
use serde::{Deserialize, Serialize};

/// What the user acted on
///
/// A graph node stands for an entity and all its mentions; a text span stands
/// for a single mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Selection {
    GraphNode(EntityId),
    TextSpan(MentionKey),
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GraphNode(id) => write!(f, "node {}", id),
            Self::TextSpan(key) => write!(f, "span {}", key),
        }
    }
}
