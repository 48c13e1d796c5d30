//! View-delta projection: change descriptor → renderer operations

use super::types::{span_id, EdgeView, NodeView, SpanView, ViewOp};
use crate::graph::{EntityId, KnowledgeGraph, MentionKey, TripleId};
use crate::reconcile::{Change, Relink};

fn node_add(new: &KnowledgeGraph, id: &EntityId) -> Option<ViewOp> {
    match new.entity(id) {
        Some(entity) => Some(ViewOp::NodeAdd(NodeView::from_entity(entity))),
        None => {
            tracing::warn!(entity = %id, "created entity missing from graph");
            None
        }
    }
}

/// Node update, only if the rendered node actually differs
fn node_refresh(old: &KnowledgeGraph, new: &KnowledgeGraph, id: &EntityId) -> Option<ViewOp> {
    let after = NodeView::from_entity(new.entity(id)?);
    match old.entity(id) {
        Some(entity) if NodeView::from_entity(entity) == after => None,
        _ => Some(ViewOp::NodeUpdate(after)),
    }
}

fn span_add(new: &KnowledgeGraph, key: &MentionKey) -> Option<ViewOp> {
    new.mention(key)
        .map(|m| ViewOp::SpanAdd(SpanView::from_mention(m)))
}

fn span_remove(old: &KnowledgeGraph, key: &MentionKey, owner: &EntityId) -> ViewOp {
    let id = old
        .mention(key)
        .map(|m| m.span_id())
        .unwrap_or_else(|| span_id(key, owner));
    ViewOp::SpanRemove { id }
}

fn edge_removes(ids: &[TripleId]) -> impl Iterator<Item = ViewOp> + '_ {
    ids.iter().map(|id| ViewOp::EdgeRemove { id: id.clone() })
}

fn edge_from(new: &KnowledgeGraph, id: &TripleId, update: bool) -> Option<ViewOp> {
    let edge = EdgeView::from_triple(new.triple(id)?);
    Some(if update {
        ViewOp::EdgeUpdate(edge)
    } else {
        ViewOp::EdgeAdd(edge)
    })
}

fn project_relink(old: &KnowledgeGraph, new: &KnowledgeGraph, relink: &Relink, merged: bool) -> Vec<ViewOp> {
    let mut ops = Vec::new();

    // Span ids embed the url, so re-linked spans are replaced, not updated.
    for key in &relink.mentions {
        ops.push(span_remove(old, key, &relink.from));
    }
    ops.extend(relink.mentions.iter().filter_map(|key| span_add(new, key)));

    if merged {
        ops.extend(node_refresh(old, new, &relink.to));
    } else {
        ops.extend(node_add(new, &relink.to));
    }

    ops.extend(edge_removes(&relink.removed_triples));
    ops.extend(
        relink
            .retargeted
            .iter()
            .filter_map(|id| edge_from(new, id, true)),
    );

    if relink.from_removed {
        ops.push(ViewOp::NodeRemove {
            id: relink.from.clone(),
        });
    } else {
        ops.extend(node_refresh(old, new, &relink.from));
    }
    ops
}

/// Translate one change into the renderer operations that bring a view of
/// `old` in line with `new`.
///
/// Nodes are added before edges that reference them and removed after the
/// edges that referenced them are gone.
pub fn project_delta(old: &KnowledgeGraph, new: &KnowledgeGraph, change: &Change) -> Vec<ViewOp> {
    let ops: Vec<ViewOp> = match change {
        Change::Unchanged => Vec::new(),
        Change::MentionAdded {
            entity,
            mention,
            entity_created,
        } => {
            let mut ops = Vec::new();
            if *entity_created {
                ops.extend(node_add(new, entity));
            } else {
                ops.extend(node_refresh(old, new, entity));
            }
            ops.extend(span_add(new, mention));
            ops
        }
        Change::MentionRelinked(relink) => project_relink(old, new, relink, false),
        Change::EntityMerged(relink) => project_relink(old, new, relink, true),
        Change::MentionDeleted {
            entity,
            mention,
            entity_removed,
            removed_triples,
        } => {
            let mut ops = vec![span_remove(old, mention, entity)];
            ops.extend(edge_removes(removed_triples));
            if *entity_removed {
                ops.push(ViewOp::NodeRemove { id: entity.clone() });
            } else {
                ops.extend(node_refresh(old, new, entity));
            }
            ops
        }
        Change::EntityRemoved {
            entity,
            mentions,
            removed_triples,
        } => {
            let mut ops: Vec<ViewOp> = mentions
                .iter()
                .map(|key| span_remove(old, key, entity))
                .collect();
            ops.extend(edge_removes(removed_triples));
            ops.push(ViewOp::NodeRemove { id: entity.clone() });
            ops
        }
        Change::TripleAdded { triple } => edge_from(new, triple, false).into_iter().collect(),
        Change::TripleUpdated { triple, .. } => edge_from(new, triple, true).into_iter().collect(),
        Change::TripleRemoved { triple } => vec![ViewOp::EdgeRemove { id: triple.clone() }],
    };

    tracing::debug!(kind = change.kind(), ops = ops.len(), "projected view delta");
    ops
}
