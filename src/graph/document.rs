//! KnowledgeGraph: the annotated document shared by text, graph and detail views

use super::entity::{Entity, EntityId};
use super::mention::{Mention, MentionKey, Span};
use super::triple::{Predicate, Triple, TripleId, TripleKey};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised while loading an ingress document
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IngestError {
    #[error("mention {new} overlaps mention {existing}")]
    Overlap { new: MentionKey, existing: MentionKey },

    #[error("mention {0} is empty or outside the source text")]
    InvalidSpan(MentionKey),

    #[error("entity {0} has no mentions")]
    EmptyEntity(EntityId),
}

/// A broken structural invariant. Reaching one is a programming error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("triple {triple} references missing entity {entity}")]
    DanglingReference { triple: TripleId, entity: EntityId },

    #[error("more than one entity with url {0}")]
    DuplicateEntity(EntityId),

    #[error("entity {0} has no mentions")]
    EmptyEntity(EntityId),

    #[error("mention {mention} points at {points_to} but is owned by {owner}")]
    MisownedMention {
        mention: MentionKey,
        points_to: EntityId,
        owner: EntityId,
    },

    #[error("mentions {0} and {1} overlap")]
    OverlappingMentions(MentionKey, MentionKey),

    #[error("flattened mention list is out of sync with entities")]
    MentionsOutOfSync,
}

/// What a normalization pass removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pruned {
    /// Entities dropped because they were left without mentions
    pub entities: Vec<EntityId>,
    /// Triples dropped because an endpoint no longer resolves
    pub triples: Vec<Triple>,
}

impl Pruned {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.triples.is_empty()
    }
}

/// Reference to an entity inside an ingress triple: either a bare url or an
/// embedded entity object carrying one, optionally with the span it was
/// extracted from.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(EntityId),
    Embedded {
        url: EntityId,
        #[serde(default)]
        text: Option<String>,
        #[serde(default, alias = "startIdx")]
        start_idx: Option<usize>,
        #[serde(default, alias = "endIdx")]
        end_idx: Option<usize>,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl EntityRef {
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Id(id) => id,
            Self::Embedded { url, .. } => url,
        }
    }

    /// Entity owning the embedded span, if the reference carries one.
    ///
    /// A missing surface form is read from `source`.
    fn to_entity(&self, source: &str) -> Result<Option<Entity>, IngestError> {
        let Self::Embedded {
            url,
            text,
            start_idx: Some(start_idx),
            end_idx: Some(end_idx),
            label,
            description,
        } = self
        else {
            return Ok(None);
        };
        let key = MentionKey::new(*start_idx, *end_idx);
        let text = match text {
            Some(text) => text.clone(),
            None => char_slice(source, key.start_idx, key.end_idx)
                .ok_or(IngestError::InvalidSpan(key))?,
        };
        let span = Span::new(text.clone(), key.start_idx, key.end_idx);
        Ok(Some(Entity {
            url: url.clone(),
            label: Some(label.clone().unwrap_or(text)),
            description: description.clone(),
            score: None,
            mentions: vec![Mention::literal(url.clone(), &span)],
        }))
    }
}

/// Triple as produced by an upstream extractor
#[derive(Debug, Clone, Deserialize)]
pub struct IngressTriple {
    #[serde(default)]
    pub id: Option<TripleId>,
    pub subject: EntityRef,
    #[serde(default)]
    pub predicate: Option<Predicate>,
    pub object: EntityRef,
}

/// Initial document handed over by an upstream extractor
#[derive(Debug, Clone, Deserialize)]
pub struct IngressDocument {
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub triples: Vec<IngressTriple>,
}

/// The shared knowledge graph of one annotated document
///
/// Entities are stored once, keyed by url; triples refer to them by id.
/// `mentions` is always the flattening of every entity's mentions and is
/// recomputed by [`KnowledgeGraph::normalize`], never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IngressDocument")]
pub struct KnowledgeGraph {
    text: String,
    entities: Vec<Entity>,
    mentions: Vec<Mention>,
    triples: Vec<Triple>,
}

impl TryFrom<IngressDocument> for KnowledgeGraph {
    type Error = IngestError;

    fn try_from(doc: IngressDocument) -> Result<Self, Self::Error> {
        KnowledgeGraph::ingest(doc)
    }
}

/// Number of characters in `text`; mention offsets count characters, not bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Substring by character offsets, `None` if out of range
pub fn char_slice(text: &str, start_idx: usize, end_idx: usize) -> Option<String> {
    if end_idx < start_idx || end_idx > char_len(text) {
        return None;
    }
    Some(text.chars().skip(start_idx).take(end_idx - start_idx).collect())
}

impl KnowledgeGraph {
    /// Create an empty graph over a source text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entities: Vec::new(),
            mentions: Vec::new(),
            triples: Vec::new(),
        }
    }

    /// Load an ingress document, establishing every invariant.
    ///
    /// Entities sharing a url are merged (the highest-scoring one supplies
    /// label and description). Triple endpoints embedding a span create the
    /// entity they name when the document does not declare it. Triples with
    /// unresolved endpoints are dropped, overlapping or out-of-range mentions
    /// are rejected, and every mention is regrounded to its owner.
    pub fn ingest(doc: IngressDocument) -> Result<Self, IngestError> {
        let text_len = char_len(&doc.text);
        let in_range = |key: MentionKey| key.end_idx > key.start_idx && key.end_idx <= text_len;
        let mut entities: Vec<Entity> = Vec::new();
        let mut index: HashMap<EntityId, usize> = HashMap::new();

        for entity in doc.entities {
            if entity.mentions.is_empty() {
                return Err(IngestError::EmptyEntity(entity.url));
            }
            if let Some(mention) = entity.mentions.iter().find(|m| !in_range(m.key())) {
                return Err(IngestError::InvalidSpan(mention.key()));
            }
            match index.get(&entity.url).copied() {
                Some(i) => {
                    let existing = &mut entities[i];
                    if entity.score.unwrap_or(f64::MIN) > existing.score.unwrap_or(f64::MIN) {
                        existing.label = entity.label;
                        existing.description = entity.description;
                        existing.score = entity.score;
                    }
                    existing.mentions.extend(entity.mentions);
                }
                None => {
                    index.insert(entity.url.clone(), entities.len());
                    entities.push(entity);
                }
            }
        }

        // Declared entities own their mentions; embedded spans only build
        // the entities the document leaves out.
        let declared = entities.len();
        for endpoint in doc.triples.iter().flat_map(|t| [&t.subject, &t.object]) {
            let Some(embedded) = endpoint.to_entity(&doc.text)? else {
                continue;
            };
            if let Some(mention) = embedded.mentions.iter().find(|m| !in_range(m.key())) {
                return Err(IngestError::InvalidSpan(mention.key()));
            }
            match index.get(&embedded.url).copied() {
                Some(i) if i < declared => {}
                Some(i) => {
                    let existing = &mut entities[i];
                    for mention in embedded.mentions {
                        if !existing.has_mention(&mention.key()) {
                            existing.mentions.push(mention);
                        }
                    }
                }
                None => {
                    index.insert(embedded.url.clone(), entities.len());
                    entities.push(embedded);
                }
            }
        }

        for entity in &mut entities {
            let mentions = std::mem::take(&mut entity.mentions);
            let label = match &entity.label {
                Some(label) => label.clone(),
                None => mentions
                    .first()
                    .map(|m| m.text.clone())
                    .unwrap_or_else(|| entity.url.to_string()),
            };
            let description = if entity.is_literal() {
                None
            } else {
                entity.description.clone()
            };
            for mut mention in mentions {
                mention.url = entity.url.clone();
                mention.label = label.clone();
                mention.description = description.clone();
                entity.mentions.push(mention);
            }
        }

        let mut keys: Vec<MentionKey> = entities
            .iter()
            .flat_map(|e| e.mentions.iter().map(|m| m.key()))
            .collect();
        keys.sort();
        for pair in keys.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(IngestError::Overlap {
                    new: pair[1],
                    existing: pair[0],
                });
            }
        }

        let triples = doc
            .triples
            .into_iter()
            .map(|t| Triple {
                id: t.id.unwrap_or_default(),
                subject: t.subject.id().clone(),
                predicate: t.predicate,
                object: t.object.id().clone(),
            })
            .collect();

        let mut kg = Self {
            text: doc.text,
            entities,
            mentions: Vec::new(),
            triples,
        };
        let pruned = kg.normalize();
        if !pruned.triples.is_empty() {
            tracing::warn!(
                count = pruned.triples.len(),
                "dropped ingress triples with unresolved endpoints"
            );
        }
        Ok(kg)
    }

    /// Source text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Every mention of every entity
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn triple_count(&self) -> usize {
        self.triples.len()
    }

    /// Resolve an entity id
    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.url == *id)
    }

    pub fn contains_entity(&self, id: &EntityId) -> bool {
        self.entity(id).is_some()
    }

    /// Entity owning the mention at `key`
    pub fn owner_of(&self, key: &MentionKey) -> Option<&Entity> {
        self.entities.iter().find(|e| e.has_mention(key))
    }

    pub fn mention(&self, key: &MentionKey) -> Option<&Mention> {
        self.mentions.iter().find(|m| m.key() == *key)
    }

    /// First mention whose span intersects `key`
    pub fn overlapping_mention(&self, key: &MentionKey) -> Option<&Mention> {
        self.mentions.iter().find(|m| m.key().overlaps(key))
    }

    pub fn triple(&self, id: &TripleId) -> Option<&Triple> {
        self.triples.iter().find(|t| t.id == *id)
    }

    pub fn find_triple(&self, key: TripleKey<'_>) -> Option<&Triple> {
        self.triples.iter().find(|t| t.key() == key)
    }

    /// Triples with either endpoint at `id`
    pub fn triples_of<'a>(&'a self, id: &'a EntityId) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| t.references(id))
    }

    pub(crate) fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.url == *id)
    }

    pub(crate) fn push_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub(crate) fn triples_mut(&mut self) -> &mut Vec<Triple> {
        &mut self.triples
    }

    /// Re-establish structural invariants after an entity mutation: drop
    /// entities without mentions, drop triples whose endpoints no longer
    /// resolve, and recompute the flattened mention list.
    pub(crate) fn normalize(&mut self) -> Pruned {
        let mut pruned = Pruned::default();

        self.entities.retain(|e| {
            if e.mentions.is_empty() {
                pruned.entities.push(e.url.clone());
                false
            } else {
                true
            }
        });

        let live: HashSet<EntityId> = self.entities.iter().map(|e| e.url.clone()).collect();
        self.triples.retain(|t| {
            if live.contains(&t.subject) && live.contains(&t.object) {
                true
            } else {
                pruned.triples.push(t.clone());
                false
            }
        });

        self.mentions = self
            .entities
            .iter()
            .flat_map(|e| e.mentions.iter().cloned())
            .collect();

        pruned
    }

    /// Verify every structural invariant of the graph.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seen: HashSet<&EntityId> = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(&entity.url) {
                return Err(InvariantViolation::DuplicateEntity(entity.url.clone()));
            }
            if entity.mentions.is_empty() {
                return Err(InvariantViolation::EmptyEntity(entity.url.clone()));
            }
            for mention in &entity.mentions {
                if mention.url != entity.url {
                    return Err(InvariantViolation::MisownedMention {
                        mention: mention.key(),
                        points_to: mention.url.clone(),
                        owner: entity.url.clone(),
                    });
                }
            }
        }

        for triple in &self.triples {
            for endpoint in [&triple.subject, &triple.object] {
                if !seen.contains(endpoint) {
                    return Err(InvariantViolation::DanglingReference {
                        triple: triple.id.clone(),
                        entity: endpoint.clone(),
                    });
                }
            }
        }

        let flattened: Vec<&Mention> = self.entities.iter().flat_map(|e| &e.mentions).collect();
        if flattened.len() != self.mentions.len()
            || !flattened.iter().all(|m| self.mentions.contains(*m))
        {
            return Err(InvariantViolation::MentionsOutOfSync);
        }

        let mut keys: Vec<MentionKey> = self.mentions.iter().map(|m| m.key()).collect();
        keys.sort();
        for pair in keys.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(InvariantViolation::OverlappingMentions(pair[0], pair[1]));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weimar_document() -> serde_json::Value {
        json!({
            "text": "The Bauhaus-Universität Weimar is a university located in Weimar, Germany.",
            "entities": [
                {
                    "url": "Q573975",
                    "label": "Bauhaus-Universität Weimar",
                    "mentions": [{"url": "Q573975", "text": "Bauhaus-Universität Weimar", "start_idx": 4, "end_idx": 30}]
                },
                {
                    "url": "Q3955",
                    "label": "Weimar",
                    "mentions": [{"url": "Q3955", "text": "Weimar", "start_idx": 58, "end_idx": 64}]
                },
                {
                    "url": "Q183",
                    "label": "Germany",
                    "mentions": [{"url": "Q183", "text": "Germany", "start_idx": 66, "end_idx": 73}]
                }
            ],
            "triples": [
                {
                    "subject": {"url": "Q573975", "start_idx": 4, "end_idx": 30, "text": "Bauhaus-Universität Weimar"},
                    "predicate": {"url": "P131", "text": "located in the administrative territorial entity"},
                    "object": {"url": "Q3955", "start_idx": 58, "end_idx": 64, "text": "Weimar"}
                },
                {
                    "subject": "Q3955",
                    "predicate": {"url": "P17", "text": "country"},
                    "object": "Q183"
                }
            ]
        })
    }

    #[test]
    fn ingest_accepts_embedded_and_bare_references() {
        let kg: KnowledgeGraph = serde_json::from_value(weimar_document()).unwrap();
        assert_eq!(kg.entity_count(), 3);
        assert_eq!(kg.triple_count(), 2);
        assert_eq!(kg.mentions().len(), 3);
        assert_eq!(kg.triples()[0].subject.as_str(), "Q573975");
        assert!(kg.check_invariants().is_ok());
    }

    #[test]
    fn ingest_merges_entities_sharing_a_url() {
        let mut doc = weimar_document();
        doc["entities"].as_array_mut().unwrap().push(json!({
            "url": "Q3955",
            "label": "Weimar (city)",
            "score": 0.9,
            "mentions": [{"url": "Q3955", "text": "Weimar", "start_idx": 24, "end_idx": 30}]
        }));
        // The new mention overlaps the university span, so shift the university.
        doc["entities"][0]["mentions"][0]["end_idx"] = json!(23);

        let kg: KnowledgeGraph = serde_json::from_value(doc).unwrap();
        assert_eq!(kg.entity_count(), 3);
        let weimar = kg.entity(&EntityId::from("Q3955")).unwrap();
        assert_eq!(weimar.mentions.len(), 2);
        assert_eq!(weimar.label.as_deref(), Some("Weimar (city)"));
        assert!(kg.check_invariants().is_ok());
    }

    #[test]
    fn ingest_rejects_overlapping_mentions() {
        let mut doc = weimar_document();
        doc["entities"][1]["mentions"][0]["start_idx"] = json!(25);
        let err = KnowledgeGraph::ingest(serde_json::from_value(doc).unwrap()).unwrap_err();
        assert!(matches!(err, IngestError::Overlap { .. }));
    }

    #[test]
    fn ingest_rejects_span_past_end_of_text() {
        let mut doc = weimar_document();
        doc["entities"][2]["mentions"][0]["end_idx"] = json!(500);
        let err = KnowledgeGraph::ingest(serde_json::from_value(doc).unwrap()).unwrap_err();
        assert_eq!(err, IngestError::InvalidSpan(MentionKey::new(66, 500)));
    }

    #[test]
    fn ingest_drops_triples_with_unknown_endpoints() {
        let mut doc = weimar_document();
        doc["triples"][1]["object"] = json!("Q999");
        let kg: KnowledgeGraph = serde_json::from_value(doc).unwrap();
        assert_eq!(kg.triple_count(), 1);
    }

    #[test]
    fn serialized_graph_loads_back() {
        let kg: KnowledgeGraph = serde_json::from_value(weimar_document()).unwrap();
        let json = serde_json::to_value(&kg).unwrap();
        assert_eq!(json["mentions"].as_array().unwrap().len(), 3);

        let reloaded: KnowledgeGraph = serde_json::from_value(json).unwrap();
        assert_eq!(reloaded, kg);
    }

    #[test]
    fn ingest_builds_entities_from_embedded_endpoints() {
        let doc = json!({
            "text": "The Bauhaus-Universität Weimar is a university located in Weimar, Germany.",
            "entities": [],
            "triples": [
                {
                    "subject": {"url": "http://www.wikidata.org/entity/Q573975", "start_idx": 4, "end_idx": 30, "text": "Bauhaus-Universität Weimar"},
                    "predicate": {"url": "http://www.wikidata.org/prop/direct/P131", "text": "located in the administrative territorial entity"},
                    "object": {"url": "http://www.wikidata.org/entity/Q3955", "start_idx": 58, "end_idx": 64, "text": "Weimar"}
                },
                {
                    "subject": {"url": "http://www.wikidata.org/entity/Q573975", "start_idx": 4, "end_idx": 30, "text": "Bauhaus-Universität Weimar"},
                    "predicate": {"url": "http://www.wikidata.org/prop/direct/P17", "text": "country"},
                    "object": {"url": "http://www.wikidata.org/entity/Q183", "start_idx": 66, "end_idx": 73, "text": "Germany"}
                },
                {
                    "subject": {"url": "http://www.wikidata.org/entity/Q3955", "start_idx": 58, "end_idx": 64, "text": "Weimar"},
                    "predicate": {"url": "http://www.wikidata.org/prop/direct/P17", "text": "country"},
                    "object": {"url": "http://www.wikidata.org/entity/Q183", "start_idx": 66, "end_idx": 73, "text": "Germany"}
                }
            ]
        });

        let kg: KnowledgeGraph = serde_json::from_value(doc).unwrap();
        assert_eq!(kg.entity_count(), 3);
        assert_eq!(kg.triple_count(), 3);
        assert_eq!(kg.mentions().len(), 3);
        let germany = kg
            .entity(&EntityId::from("http://www.wikidata.org/entity/Q183"))
            .unwrap();
        assert_eq!(germany.label.as_deref(), Some("Germany"));
        assert_eq!(germany.mentions[0].key(), MentionKey::new(66, 73));
        assert!(kg.check_invariants().is_ok());
    }

    #[test]
    fn declared_entities_take_precedence_over_embedded_spans() {
        let mut doc = weimar_document();
        // Declared Weimar lives at 58..64; the embedded copy disagrees.
        doc["triples"][0]["object"]["start_idx"] = json!(36);
        doc["triples"][0]["object"]["end_idx"] = json!(46);

        let kg: KnowledgeGraph = serde_json::from_value(doc).unwrap();
        let weimar = kg.entity(&EntityId::from("Q3955")).unwrap();
        assert_eq!(weimar.mentions.len(), 1);
        assert_eq!(weimar.mentions[0].key(), MentionKey::new(58, 64));
    }

    #[test]
    fn embedded_span_past_end_of_text_is_rejected() {
        let mut doc = weimar_document();
        doc["entities"] = json!([]);
        doc["triples"][0]["object"]["end_idx"] = json!(500);
        let err = KnowledgeGraph::ingest(serde_json::from_value(doc).unwrap()).unwrap_err();
        assert_eq!(err, IngestError::InvalidSpan(MentionKey::new(58, 500)));
    }

    #[test]
    fn ingested_mentions_follow_their_entity() {
        let mut doc = weimar_document();
        doc["entities"][1]["description"] = json!("city in Thuringia");
        doc["entities"][1]["mentions"][0]["url"] = json!("Q999");

        let kg: KnowledgeGraph = serde_json::from_value(doc).unwrap();
        let mention = kg.mention(&MentionKey::new(58, 64)).unwrap();
        assert_eq!(mention.url.as_str(), "Q3955");
        assert_eq!(mention.label, "Weimar");
        assert_eq!(mention.description.as_deref(), Some("city in Thuringia"));
    }

    #[test]
    fn char_slice_counts_characters() {
        let text = "Universität Weimar";
        assert_eq!(char_slice(text, 12, 18).as_deref(), Some("Weimar"));
        assert_eq!(char_slice(text, 12, 19), None);
    }
}
