//! Change descriptors and operation outcomes

use crate::graph::{EntityId, IngestError, InvariantViolation, KnowledgeGraph, MentionKey, Predicate, TripleId};
use serde::Serialize;
use thiserror::Error;

/// Why a reconciliation request was rejected
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReconcileError {
    #[error("span {span} overlaps existing mention {existing}")]
    Overlap { span: MentionKey, existing: MentionKey },

    #[error("span {0} is empty or outside the source text")]
    InvalidSpan(MentionKey),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invariant violated: {0}")]
    Invariant(InvariantViolation),
}

impl From<InvariantViolation> for ReconcileError {
    fn from(v: InvariantViolation) -> Self {
        Self::Invariant(v)
    }
}

impl From<IngestError> for ReconcileError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Overlap { new, existing } => Self::Overlap { span: new, existing },
            IngestError::InvalidSpan(key) => Self::InvalidSpan(key),
            IngestError::EmptyEntity(id) => Self::NotFound(format!("mentions of entity {}", id)),
        }
    }
}

/// Result type for reconciliation
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Details of moving one or more mentions to another canonical entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relink {
    /// Entity that owned the mentions before
    pub from: EntityId,
    /// Entity that owns them now
    pub to: EntityId,
    pub mentions: Vec<MentionKey>,
    /// `from` lost its last mention and was removed
    pub from_removed: bool,
    /// Triples whose subject or object moved from `from` to `to`
    pub retargeted: Vec<TripleId>,
    /// Triples dropped (duplicates created by retargeting, or dangling)
    pub removed_triples: Vec<TripleId>,
}

/// What a reconciliation step changed
///
/// Carries enough ids for the view projector to act without diffing the
/// whole graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Change {
    /// Nothing changed (already applied, target missing, or rejected)
    Unchanged,
    MentionAdded {
        entity: EntityId,
        mention: MentionKey,
        /// False when the mention joined an entity already in the graph
        entity_created: bool,
    },
    /// Mentions moved to a newly created entity
    MentionRelinked(Relink),
    /// Mentions moved into an entity that already existed
    EntityMerged(Relink),
    MentionDeleted {
        entity: EntityId,
        mention: MentionKey,
        entity_removed: bool,
        removed_triples: Vec<TripleId>,
    },
    EntityRemoved {
        entity: EntityId,
        mentions: Vec<MentionKey>,
        removed_triples: Vec<TripleId>,
    },
    TripleAdded {
        triple: TripleId,
    },
    TripleUpdated {
        triple: TripleId,
        previous: Option<Predicate>,
    },
    TripleRemoved {
        triple: TripleId,
    },
}

impl Change {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Kebab-case tag of this change
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::MentionAdded { .. } => "mention-added",
            Self::MentionRelinked(_) => "mention-relinked",
            Self::EntityMerged(_) => "entity-merged",
            Self::MentionDeleted { .. } => "mention-deleted",
            Self::EntityRemoved { .. } => "entity-removed",
            Self::TripleAdded { .. } => "triple-added",
            Self::TripleUpdated { .. } => "triple-updated",
            Self::TripleRemoved { .. } => "triple-removed",
        }
    }
}

/// The result of one reconciliation operation.
///
/// Operations never partially apply: when `error` is set, `kg` equals the
/// input graph and `change` is [`Change::Unchanged`].
#[derive(Debug, Clone)]
pub struct Outcome {
    pub kg: KnowledgeGraph,
    pub change: Change,
    pub error: Option<ReconcileError>,
}

impl Outcome {
    pub(crate) fn applied(kg: KnowledgeGraph, change: Change) -> Self {
        Self {
            kg,
            change,
            error: None,
        }
    }

    pub(crate) fn unchanged(kg: &KnowledgeGraph) -> Self {
        Self {
            kg: kg.clone(),
            change: Change::Unchanged,
            error: None,
        }
    }

    pub(crate) fn rejected(kg: &KnowledgeGraph, error: ReconcileError) -> Self {
        tracing::warn!(%error, "reconciliation rejected");
        Self {
            kg: kg.clone(),
            change: Change::Unchanged,
            error: Some(error),
        }
    }

    /// `unchanged: true` in the descriptor sense
    pub fn is_unchanged(&self) -> bool {
        self.change.is_unchanged()
    }

    /// Convert into a `Result`, treating any rejection as an error
    pub fn into_result(self) -> ReconcileResult<(KnowledgeGraph, Change)> {
        match self.error {
            Some(e) => Err(e),
            None => Ok((self.kg, self.change)),
        }
    }
}
