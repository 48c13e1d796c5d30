//! Core knowledge graph data structures

mod document;
mod entity;
mod mention;
mod triple;


pub use document::{
    char_len, char_slice, EntityRef, IngestError, IngressDocument, IngressTriple,
    InvariantViolation, KnowledgeGraph, Pruned,
};
pub use entity::{Entity, EntityId, LITERAL_DESCRIPTION};
pub use mention::{Mention, MentionKey, Span};
pub use triple::{Predicate, Triple, TripleId, TripleKey};
