//! View records and view operations consumed by external renderers

use crate::graph::{Entity, EntityId, KnowledgeGraph, Mention, MentionKey, Triple, TripleId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A graph-widget node for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: EntityId,
    pub label: String,
    /// Hover text: the description, or the url when there is none
    pub title: String,
}

impl NodeView {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.url.clone(),
            label: entity.display_label().to_string(),
            title: entity
                .description
                .clone()
                .unwrap_or_else(|| entity.url.to_string()),
        }
    }
}

/// A graph-widget edge for one triple, keyed by the triple's stable id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub id: TripleId,
    pub from: EntityId,
    pub to: EntityId,
    /// Predicate label; empty while no predicate is chosen
    pub label: String,
    pub title: Option<String>,
}

impl EdgeView {
    pub fn from_triple(triple: &Triple) -> Self {
        Self {
            id: triple.id.clone(),
            from: triple.subject.clone(),
            to: triple.object.clone(),
            label: triple
                .predicate
                .as_ref()
                .map(|p| p.label.clone())
                .unwrap_or_default(),
            title: triple.predicate.as_ref().and_then(|p| p.description.clone()),
        }
    }
}

/// Identifier of a rendered text span: `start_idx:end_idx:url`
pub fn span_id(key: &MentionKey, url: &EntityId) -> String {
    format!("{}:{}:{}", key.start_idx, key.end_idx, url)
}

/// A highlighted span in the text view for one mention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanView {
    pub id: String,
    pub start_idx: usize,
    pub end_idx: usize,
    pub text: String,
    pub url: EntityId,
    pub label: String,
    pub description: Option<String>,
}

impl SpanView {
    pub fn from_mention(mention: &Mention) -> Self {
        Self {
            id: mention.span_id(),
            start_idx: mention.start_idx,
            end_idx: mention.end_idx,
            text: mention.text.clone(),
            url: mention.url.clone(),
            label: mention.label.clone(),
            description: mention.description.clone(),
        }
    }
}

/// One incremental instruction for a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum ViewOp {
    NodeAdd(NodeView),
    /// Label/description refresh; position and selection are kept
    NodeUpdate(NodeView),
    NodeRemove { id: EntityId },
    EdgeAdd(EdgeView),
    /// Endpoints or label rewritten; edge identity is kept
    EdgeUpdate(EdgeView),
    EdgeRemove { id: TripleId },
    SpanAdd(SpanView),
    SpanRemove { id: String },
}

/// Complete view state derivable from a graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub nodes: HashMap<EntityId, NodeView>,
    pub edges: HashMap<TripleId, EdgeView>,
    /// Ordered by span id; use [`super::segments`] for text order
    pub spans: BTreeMap<String, SpanView>,
}

impl ViewState {
    /// Full projection: one node per entity, one edge per triple, one span
    /// per mention.
    pub fn from_kg(kg: &KnowledgeGraph) -> Self {
        Self {
            nodes: kg
                .entities()
                .iter()
                .map(|e| (e.url.clone(), NodeView::from_entity(e)))
                .collect(),
            edges: kg
                .triples()
                .iter()
                .map(|t| (t.id.clone(), EdgeView::from_triple(t)))
                .collect(),
            spans: kg
                .mentions()
                .iter()
                .map(|m| (m.span_id(), SpanView::from_mention(m)))
                .collect(),
        }
    }

    /// Apply operations in order, as a renderer would.
    pub fn apply(&mut self, ops: &[ViewOp]) {
        for op in ops {
            match op {
                ViewOp::NodeAdd(node) | ViewOp::NodeUpdate(node) => {
                    self.nodes.insert(node.id.clone(), node.clone());
                }
                ViewOp::NodeRemove { id } => {
                    self.nodes.remove(id);
                }
                ViewOp::EdgeAdd(edge) | ViewOp::EdgeUpdate(edge) => {
                    self.edges.insert(edge.id.clone(), edge.clone());
                }
                ViewOp::EdgeRemove { id } => {
                    self.edges.remove(id);
                }
                ViewOp::SpanAdd(span) => {
                    self.spans.insert(span.id.clone(), span.clone());
                }
                ViewOp::SpanRemove { id } => {
                    self.spans.remove(id);
                }
            }
        }
    }
}
