//! Reconciler: the invariant-preserving edit operations

use super::change::{Change, Outcome, ReconcileError, Relink};
use super::Selection;
use crate::candidate::Candidate;
use crate::graph::{
    char_len, Entity, EntityId, KnowledgeGraph, Mention, MentionKey, Predicate, Span, Triple,
    TripleId,
};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

/// Namespace for synthetic ids of ungrounded literals
pub const DEFAULT_LITERAL_NAMESPACE: &str = "http://kgsync.local/literal/";

/// One user edit, in a form that can be scripted
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddMention {
        span: Span,
        #[serde(default)]
        candidate: Option<Candidate>,
    },
    Relink {
        selection: Selection,
        candidate: Candidate,
    },
    Delete {
        selection: Selection,
    },
    SetPredicate {
        triple: Triple,
        predicate: Option<Predicate>,
    },
    DeleteTriple {
        triple: Triple,
    },
}

/// Applies edits to knowledge graphs
#[derive(Debug, Clone)]
pub struct Reconciler {
    literal_namespace: String,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Move `mentions` into the entity with `template.url`, creating it from
/// `template` if the graph has no such entity. Returns true if created.
fn attach(kg: &mut KnowledgeGraph, template: Entity, mentions: Vec<Mention>) -> bool {
    if let Some(existing) = kg.entity_mut(&template.url) {
        for mention in mentions {
            existing.adopt(mention);
        }
        return false;
    }
    let mut entity = Entity {
        mentions: Vec::new(),
        ..template
    };
    for mention in mentions {
        entity.adopt(mention);
    }
    kg.push_entity(entity);
    true
}

type OwnedTripleKey = (EntityId, Option<String>, EntityId);

fn owned_key(t: &Triple) -> OwnedTripleKey {
    (t.subject.clone(), t.predicate_url().map(str::to_string), t.object.clone())
}

/// Drop retargeted triples whose `(subject, predicate, object)` now repeats
/// another triple. Untouched triples always stay, keeping their ids; among
/// colliding retargeted triples the first one stays.
fn drop_retarget_collisions(triples: &mut Vec<Triple>, retargeted: &[TripleId]) -> Vec<TripleId> {
    let mut seen: HashSet<OwnedTripleKey> = triples
        .iter()
        .filter(|t| !retargeted.contains(&t.id))
        .map(owned_key)
        .collect();
    let mut removed = Vec::new();
    triples.retain(|t| {
        if !retargeted.contains(&t.id) || seen.insert(owned_key(t)) {
            true
        } else {
            removed.push(t.id.clone());
            false
        }
    });
    removed
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            literal_namespace: DEFAULT_LITERAL_NAMESPACE.to_string(),
        }
    }

    pub fn with_literal_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.literal_namespace = namespace.into();
        self
    }

    pub fn literal_namespace(&self) -> &str {
        &self.literal_namespace
    }

    /// Apply a scripted edit
    pub fn apply(&self, kg: &KnowledgeGraph, edit: &Edit) -> Outcome {
        match edit {
            Edit::AddMention { span, candidate } => self.add_mention(kg, span, candidate.as_ref()),
            Edit::Relink {
                selection,
                candidate,
            } => self.relink(kg, selection, candidate),
            Edit::Delete { selection } => self.delete(kg, selection),
            Edit::SetPredicate { triple, predicate } => {
                self.set_predicate(kg, triple, predicate.clone())
            }
            Edit::DeleteTriple { triple } => self.delete_triple(kg, triple),
        }
    }

    /// Annotate a new span of the source text.
    ///
    /// Without a hint the span becomes an ungrounded literal entity. With a
    /// hint it is grounded to that candidate directly. Either way the mention
    /// joins an existing entity with the same url instead of duplicating it.
    pub fn add_mention(&self, kg: &KnowledgeGraph, span: &Span, hint: Option<&Candidate>) -> Outcome {
        let key = span.key();
        if span.is_empty() || key.end_idx > char_len(kg.text()) {
            return Outcome::rejected(kg, ReconcileError::InvalidSpan(key));
        }
        if let Some(existing) = kg.overlapping_mention(&key) {
            return Outcome::rejected(
                kg,
                ReconcileError::Overlap {
                    span: key,
                    existing: existing.key(),
                },
            );
        }

        let mut template = match hint {
            Some(candidate) => candidate.to_entity(),
            None => Entity::literal(&self.literal_namespace, span),
        };
        template.mentions.clear();
        let mention = Mention::literal(template.url.clone(), span);
        let entity = template.url.clone();

        let mut next = kg.clone();
        let entity_created = attach(&mut next, template, vec![mention]);
        next.normalize();

        debug!(%entity, mention = %key, entity_created, "mention added");
        self.finish(
            kg,
            next,
            Change::MentionAdded {
                entity,
                mention: key,
                entity_created,
            },
        )
    }

    /// Re-ground the selected mention(s) to `candidate`.
    ///
    /// A graph node moves every mention of its entity; a text span moves one.
    /// Triples follow the old entity to the new one only when the old entity
    /// is left without mentions.
    pub fn relink(&self, kg: &KnowledgeGraph, selection: &Selection, candidate: &Candidate) -> Outcome {
        let (from, keys): (EntityId, Vec<MentionKey>) = match selection {
            Selection::GraphNode(id) => match kg.entity(id) {
                Some(entity) => (
                    entity.url.clone(),
                    entity.mentions.iter().map(Mention::key).collect(),
                ),
                None => return Outcome::rejected(kg, ReconcileError::NotFound(format!("entity {}", id))),
            },
            Selection::TextSpan(key) => match kg.owner_of(key) {
                Some(entity) => (entity.url.clone(), vec![*key]),
                None => return Outcome::rejected(kg, ReconcileError::NotFound(format!("mention {}", key))),
            },
        };

        let to = candidate.url.clone();
        if from == to {
            debug!(%selection, %to, "already linked");
            return Outcome::unchanged(kg);
        }

        let mut next = kg.clone();
        let mut moved = Vec::with_capacity(keys.len());
        let from_removed = match next.entity_mut(&from) {
            Some(owner) => {
                for key in &keys {
                    moved.extend(owner.take_mention(key));
                }
                owner.mentions.is_empty()
            }
            None => false,
        };
        let created = attach(&mut next, candidate.to_entity(), moved);

        let mut retargeted = Vec::new();
        let mut removed_triples = Vec::new();
        if from_removed {
            for triple in next.triples_mut().iter_mut() {
                let mut touched = false;
                if triple.subject == from {
                    triple.subject = to.clone();
                    touched = true;
                }
                if triple.object == from {
                    triple.object = to.clone();
                    touched = true;
                }
                if touched {
                    retargeted.push(triple.id.clone());
                }
            }
            removed_triples.extend(drop_retarget_collisions(next.triples_mut(), &retargeted));
        }

        let pruned = next.normalize();
        removed_triples.extend(pruned.triples.into_iter().map(|t| t.id));
        retargeted.retain(|id| !removed_triples.contains(id));

        debug!(
            %from,
            %to,
            mentions = keys.len(),
            from_removed,
            retargeted = retargeted.len(),
            merged = !created,
            "mentions relinked"
        );

        let relink = Relink {
            from,
            to,
            mentions: keys,
            from_removed,
            retargeted,
            removed_triples,
        };
        let change = if created {
            Change::MentionRelinked(relink)
        } else {
            Change::EntityMerged(relink)
        };
        self.finish(kg, next, change)
    }

    /// Remove a whole entity (graph node) or a single mention (text span).
    ///
    /// Triples left without an endpoint are pruned.
    pub fn delete(&self, kg: &KnowledgeGraph, selection: &Selection) -> Outcome {
        match selection {
            Selection::GraphNode(id) => {
                let mentions: Vec<MentionKey> = match kg.entity(id) {
                    Some(entity) => entity.mentions.iter().map(Mention::key).collect(),
                    None => return Outcome::rejected(kg, ReconcileError::NotFound(format!("entity {}", id))),
                };
                let mut next = kg.clone();
                if let Some(entity) = next.entity_mut(id) {
                    entity.mentions.clear();
                }
                let pruned = next.normalize();
                let removed_triples: Vec<TripleId> = pruned.triples.into_iter().map(|t| t.id).collect();

                debug!(entity = %id, triples = removed_triples.len(), "entity removed");
                self.finish(
                    kg,
                    next,
                    Change::EntityRemoved {
                        entity: id.clone(),
                        mentions,
                        removed_triples,
                    },
                )
            }
            Selection::TextSpan(key) => {
                let entity = match kg.owner_of(key) {
                    Some(owner) => owner.url.clone(),
                    None => return Outcome::rejected(kg, ReconcileError::NotFound(format!("mention {}", key))),
                };
                let mut next = kg.clone();
                if let Some(owner) = next.entity_mut(&entity) {
                    owner.take_mention(key);
                }
                let pruned = next.normalize();
                let entity_removed = pruned.entities.contains(&entity);
                let removed_triples: Vec<TripleId> = pruned.triples.into_iter().map(|t| t.id).collect();

                debug!(%entity, mention = %key, entity_removed, "mention deleted");
                self.finish(
                    kg,
                    next,
                    Change::MentionDeleted {
                        entity,
                        mention: *key,
                        entity_removed,
                        removed_triples,
                    },
                )
            }
        }
    }

    /// Set the predicate of `triple`, inserting the triple if the graph has
    /// none with the same id or the same subject and object.
    pub fn set_predicate(&self, kg: &KnowledgeGraph, triple: &Triple, predicate: Option<Predicate>) -> Outcome {
        let existing = kg
            .triple(&triple.id)
            .or_else(|| kg.triples().iter().find(|t| t.connects(&triple.subject, &triple.object)));

        match existing {
            Some(current) => {
                let new_url = predicate.as_ref().map(|p| p.url.as_str());
                if current.predicate_url() == new_url {
                    debug!(triple = %current.id, "predicate unchanged");
                    return Outcome::unchanged(kg);
                }
                let id = current.id.clone();
                let mut next = kg.clone();
                let mut previous = None;
                if let Some(t) = next.triples_mut().iter_mut().find(|t| t.id == id) {
                    previous = std::mem::replace(&mut t.predicate, predicate);
                }
                debug!(triple = %id, "predicate updated");
                self.finish(kg, next, Change::TripleUpdated { triple: id, previous })
            }
            None => {
                let Some(predicate) = predicate else {
                    return Outcome::unchanged(kg);
                };
                for endpoint in [&triple.subject, &triple.object] {
                    if !kg.contains_entity(endpoint) {
                        return Outcome::rejected(kg, ReconcileError::NotFound(format!("entity {}", endpoint)));
                    }
                }
                let id = triple.id.clone();
                let mut next = kg.clone();
                next.triples_mut().push(Triple {
                    id: id.clone(),
                    subject: triple.subject.clone(),
                    predicate: Some(predicate),
                    object: triple.object.clone(),
                });
                debug!(triple = %id, "triple added");
                self.finish(kg, next, Change::TripleAdded { triple: id })
            }
        }
    }

    /// Remove the triple with the same `(subject, predicate, object)`
    pub fn delete_triple(&self, kg: &KnowledgeGraph, triple: &Triple) -> Outcome {
        let id = match kg.find_triple(triple.key()) {
            Some(t) => t.id.clone(),
            None => {
                return Outcome::rejected(
                    kg,
                    ReconcileError::NotFound(format!(
                        "triple ({}, {}, {})",
                        triple.subject,
                        triple.predicate_url().unwrap_or("null"),
                        triple.object
                    )),
                )
            }
        };
        let mut next = kg.clone();
        next.triples_mut().retain(|t| t.id != id);
        debug!(triple = %id, "triple removed");
        self.finish(kg, next, Change::TripleRemoved { triple: id })
    }

    fn finish(&self, input: &KnowledgeGraph, next: KnowledgeGraph, change: Change) -> Outcome {
        if let Err(violation) = next.check_invariants() {
            tracing::error!(%violation, kind = change.kind(), "edit broke a graph invariant");
            debug_assert!(false, "edit broke a graph invariant: {}", violation);
            return Outcome::rejected(input, violation.into());
        }
        Outcome::applied(next, change)
    }
}
