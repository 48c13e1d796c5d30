//! RDF export of the final graph as N-Triples-style statements
//!
//! Each line is `<subject> <predicate> <object> .` or, for ungrounded
//! objects, `<subject> <predicate> "<literal id>" .`. Every entity and
//! predicate gets a label and a description statement, empty when unknown.
//! Statements are deduplicated and kept in first-seen order.

use crate::graph::{Entity, KnowledgeGraph, Predicate};
use crate::reconcile::DEFAULT_LITERAL_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// IRIs used by the export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespaces {
    /// Prefix of synthetic ids for ungrounded literals
    pub literal: String,
    /// Prefix for the document subject and its text attribute
    pub source: String,
    pub label: String,
    pub description: String,
    pub rdf_type: String,
    pub property: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            literal: DEFAULT_LITERAL_NAMESPACE.to_string(),
            source: "http://kgsync.local/source/".to_string(),
            label: "http://www.w3.org/2000/01/rdf-schema#label".to_string(),
            description: "http://schema.org/description".to_string(),
            rdf_type: "http://www.w3.org/1999/02/22-rdf-syntax-ns#type".to_string(),
            property: "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property".to_string(),
        }
    }
}

impl Namespaces {
    pub fn document(&self) -> String {
        format!("{}document", self.source)
    }

    pub fn document_text(&self) -> String {
        format!("{}text", self.source)
    }
}

fn iri(value: &str) -> String {
    format!("<{}>", value)
}

/// Quoted N-Triples string literal
fn literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Insertion-ordered set of statements
#[derive(Default)]
struct Statements {
    seen: HashSet<String>,
    lines: Vec<String>,
}

impl Statements {
    fn push(&mut self, subject: &str, predicate: &str, object: String) {
        let line = format!("{} {} {} .", subject, iri(predicate), object);
        if self.seen.insert(line.clone()) {
            self.lines.push(line);
        }
    }

    fn predicate(&mut self, ns: &Namespaces, predicate: &Predicate) {
        let subject = iri(&predicate.url);
        self.push(&subject, &ns.rdf_type, iri(&ns.property));
        self.push(&subject, &ns.label, literal(&predicate.label));
        let description = predicate.description.as_deref().unwrap_or_default();
        self.push(&subject, &ns.description, literal(description));
    }

    fn entity(&mut self, ns: &Namespaces, entity: &Entity) {
        let subject = iri(entity.url.as_str());
        self.push(&subject, &ns.label, literal(entity.display_label()));
        let description = entity.description.as_deref().unwrap_or_default();
        self.push(&subject, &ns.description, literal(description));
    }
}

/// Serialize the graph's triples, predicate and entity metadata, and the
/// source text.
///
/// Triples still waiting for a predicate are skipped.
pub fn export_triples(kg: &KnowledgeGraph, ns: &Namespaces) -> String {
    let mut out = Statements::default();

    for triple in kg.triples() {
        let Some(predicate) = &triple.predicate else {
            continue;
        };
        let (Some(subject), Some(object)) = (kg.entity(&triple.subject), kg.entity(&triple.object)) else {
            continue;
        };

        let object_term = if object.is_literal() {
            literal(object.url.as_str())
        } else {
            iri(object.url.as_str())
        };
        out.push(&iri(subject.url.as_str()), &predicate.url, object_term);
        out.predicate(ns, predicate);
        out.entity(ns, subject);
        out.entity(ns, object);
    }

    for entity in kg.entities() {
        out.entity(ns, entity);
    }

    out.push(&iri(&ns.document()), &ns.document_text(), literal(kg.text()));

    tracing::debug!(statements = out.lines.len(), "exported graph");
    out.lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use crate::graph::{EntityId, Span, Triple};
    use crate::reconcile::Reconciler;

    const TEXT: &str = "Weimar and Jena are in Germany.";

    fn graph() -> KnowledgeGraph {
        let r = Reconciler::new();
        let mut kg = KnowledgeGraph::new(TEXT);
        for (text, start, end, url) in [
            ("Weimar", 0, 6, "http://www.wikidata.org/entity/Q3955"),
            ("Jena", 11, 15, "http://www.wikidata.org/entity/Q3150"),
            ("Germany", 23, 30, "http://www.wikidata.org/entity/Q183"),
        ] {
            let candidate = Candidate::new(url, text).with_description("place");
            kg = r.add_mention(&kg, &Span::new(text, start, end), Some(&candidate)).kg;
        }
        let country = Predicate::new("http://www.wikidata.org/prop/direct/P17", "country");
        for subject in ["http://www.wikidata.org/entity/Q3955", "http://www.wikidata.org/entity/Q3150"] {
            let draft = Triple::new(
                EntityId::from(subject),
                None,
                EntityId::from("http://www.wikidata.org/entity/Q183"),
            );
            kg = r.set_predicate(&kg, &draft, Some(country.clone())).kg;
        }
        kg
    }

    #[test]
    fn shared_predicate_is_described_once() {
        let out = export_triples(&graph(), &Namespaces::default());
        let label_lines = out
            .lines()
            .filter(|l| {
                l.starts_with("<http://www.wikidata.org/prop/direct/P17> <http://www.w3.org/2000/01/rdf-schema#label>")
            })
            .count();
        assert_eq!(label_lines, 1);
        let type_lines = out
            .lines()
            .filter(|l| l.contains("22-rdf-syntax-ns#type"))
            .count();
        assert_eq!(type_lines, 1);
    }

    #[test]
    fn statements_follow_first_seen_triple_order() {
        let out = export_triples(&graph(), &Namespaces::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "<http://www.wikidata.org/entity/Q3955> <http://www.wikidata.org/prop/direct/P17> <http://www.wikidata.org/entity/Q183> ."
        );
        assert_eq!(
            lines[1],
            "<http://www.wikidata.org/prop/direct/P17> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/1999/02/22-rdf-syntax-ns#Property> ."
        );
        assert_eq!(
            *lines.last().unwrap(),
            "<http://kgsync.local/source/document> <http://kgsync.local/source/text> \"Weimar and Jena are in Germany.\" ."
        );
        let unique: HashSet<&str> = lines.iter().copied().collect();
        assert_eq!(unique.len(), lines.len());
    }

    #[test]
    fn export_is_deterministic() {
        let kg = graph();
        let ns = Namespaces::default();
        assert_eq!(export_triples(&kg, &ns), export_triples(&kg, &ns));
    }

    #[test]
    fn literal_objects_are_quoted() {
        let r = Reconciler::new();
        let kg = r
            .add_mention(&graph(), &Span::new("are", 16, 19), None)
            .kg;
        let draft = Triple::new(
            EntityId::from("http://www.wikidata.org/entity/Q3150"),
            None,
            EntityId::literal(r.literal_namespace(), "are"),
        );
        let kg = r
            .set_predicate(&kg, &draft, Some(Predicate::new("http://example.org/note", "note")))
            .kg;

        let out = export_triples(&kg, &Namespaces::default());
        assert!(out.contains(
            "<http://www.wikidata.org/entity/Q3150> <http://example.org/note> \"http://kgsync.local/literal/are\" ."
        ));
        assert!(out.contains(
            "<http://kgsync.local/literal/are> <http://www.w3.org/2000/01/rdf-schema#label> \"are\" ."
        ));
    }

    #[test]
    fn missing_descriptions_export_as_empty_literals() {
        let r = Reconciler::new();
        let kg = r
            .add_mention(&graph(), &Span::new("are", 16, 19), Some(&Candidate::new("http://example.org/are", "are")))
            .kg;
        let out = export_triples(&kg, &Namespaces::default());
        assert!(out.contains("<http://example.org/are> <http://schema.org/description> \"\" ."));
        assert!(out.contains(
            "<http://www.wikidata.org/prop/direct/P17> <http://schema.org/description> \"\" ."
        ));
        assert!(out.contains("<http://www.wikidata.org/entity/Q183> <http://schema.org/description> \"place\" ."));
    }

    #[test]
    fn triples_without_predicate_are_skipped() {
        let kg = graph();
        let triple = kg.triples()[0].clone();
        let kg = Reconciler::new().set_predicate(&kg, &triple, None).kg;
        let out = export_triples(&kg, &Namespaces::default());
        assert!(!out.contains(
            "<http://www.wikidata.org/entity/Q3955> <http://www.wikidata.org/prop/direct/P17>"
        ));
        assert!(out.contains("<http://www.wikidata.org/entity/Q3150> <http://www.wikidata.org/prop/direct/P17>"));
    }

    #[test]
    fn literal_escaping() {
        assert_eq!(literal("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(literal("a\\b"), "\"a\\\\b\"");
    }
}
