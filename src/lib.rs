//! kgsync: knowledge graph reconciliation for annotated text
//!
//! Keeps a source text, the entities mentioned in it, and the triples
//! between those entities consistent while a user edits annotations.
//!
//! # Core Concepts
//!
//! - **Entities**: identified by url, owning the text mentions that refer to them
//! - **Triples**: subject/predicate/object statements over entities
//! - **Reconciler**: the edit operations, each returning the new graph and a
//!   change descriptor
//! - **View projection**: change descriptors turned into incremental
//!   renderer operations
//!
//! # Example
//!
//! ```
//! use kgsync::{KnowledgeGraph, Reconciler, Span};
//!
//! let kg = KnowledgeGraph::new("Paris is lovely.");
//! let outcome = Reconciler::new().add_mention(&kg, &Span::new("Paris", 0, 5), None);
//! assert_eq!(outcome.kg.entity_count(), 1);
//! ```

pub mod candidate;
pub mod config;
pub mod export;
pub mod graph;
pub mod reconcile;
pub mod session;
pub mod view;

pub use candidate::{Candidate, CandidateSource, SearchNamespace, SearchTracker};
pub use config::{Config, ConfigError};
pub use export::{export_triples, Namespaces};
pub use graph::{
    Entity, EntityId, IngestError, InvariantViolation, KnowledgeGraph, Mention, MentionKey,
    Predicate, Span, Triple, TripleId,
};
pub use reconcile::{Change, Edit, Outcome, ReconcileError, ReconcileResult, Reconciler, Selection};
pub use session::{Applied, Document, DocumentId, DocumentStore, SessionError};
pub use view::{project_delta, ViewOp, ViewState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
