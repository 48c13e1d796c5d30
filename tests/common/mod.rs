//! Shared fixtures for kgsync integration tests

#![allow(dead_code)]

use kgsync::{KnowledgeGraph, Mention};
use serde_json::json;
use std::collections::HashSet;

/// "Paris" at [0,5) and [20,25), "France" at [37,43)
pub const PARIS_TEXT: &str = "Paris is lovely and Paris is old, in France.";

/// Ingress document with `Q1` (Paris), `Q2` (France) and `(Q1, P17, Q2)`.
///
/// With `both_mentions` false, `Q1` owns only the first "Paris".
pub fn paris_document(both_mentions: bool) -> KnowledgeGraph {
    let mut paris_mentions = vec![json!({
        "url": "Q1", "text": "Paris", "startIdx": 0, "endIdx": 5,
        "label": "Paris", "description": "capital of France"
    })];
    if both_mentions {
        paris_mentions.push(json!({
            "url": "Q1", "text": "Paris", "startIdx": 20, "endIdx": 25,
            "label": "Paris", "description": "capital of France"
        }));
    }

    let doc = json!({
        "text": PARIS_TEXT,
        "entities": [
            {
                "url": "Q1",
                "label": "Paris",
                "description": "capital of France",
                "score": 0.9,
                "mentions": paris_mentions
            },
            {
                "url": "Q2",
                "label": "France",
                "description": "country in Europe",
                "mentions": [{
                    "url": "Q2", "text": "France", "startIdx": 37, "endIdx": 43,
                    "label": "France", "description": "country in Europe"
                }]
            }
        ],
        "triples": [
            {
                "id": "t-paris-country",
                "subject": { "url": "Q1", "text": "Paris" },
                "predicate": { "url": "P17", "label": "country" },
                "object": "Q2"
            }
        ]
    });
    serde_json::from_value(doc).expect("fixture document is valid")
}

/// Check every structural invariant independently of the library's own check.
pub fn assert_invariants(kg: &KnowledgeGraph) {
    kg.check_invariants().expect("graph invariants hold");

    let mut flattened: Vec<&Mention> = kg.entities().iter().flat_map(|e| e.mentions.iter()).collect();
    let mut derived: Vec<&Mention> = kg.mentions().iter().collect();
    flattened.sort_by_key(|m| m.start_idx);
    derived.sort_by_key(|m| m.start_idx);
    assert_eq!(flattened, derived, "mentions must be the flattening of entity mentions");

    let urls: HashSet<_> = kg.entities().iter().map(|e| &e.url).collect();
    assert_eq!(urls.len(), kg.entity_count(), "entity urls must be unique");

    for entity in kg.entities() {
        assert!(!entity.mentions.is_empty(), "entity {} has no mentions", entity.url);
    }
    for triple in kg.triples() {
        assert!(urls.contains(&triple.subject), "dangling subject {}", triple.subject);
        assert!(urls.contains(&triple.object), "dangling object {}", triple.object);
    }
}
