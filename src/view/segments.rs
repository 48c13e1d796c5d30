//! Text view layout: plain runs interleaved with mention spans

use super::types::SpanView;
use crate::graph::{char_slice, KnowledgeGraph};
use serde::Serialize;

/// One run of the text view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Segment {
    Plain(String),
    Span(SpanView),
}

/// Split the source text into plain runs and mention spans, in text order.
///
/// Empty plain runs are omitted.
pub fn segments(kg: &KnowledgeGraph) -> Vec<Segment> {
    let text = kg.text();
    let mut mentions: Vec<_> = kg.mentions().iter().collect();
    mentions.sort_by_key(|m| m.start_idx);

    let mut out = Vec::with_capacity(mentions.len() * 2 + 1);
    let mut idx = 0;
    for mention in mentions {
        if let Some(plain) = char_slice(text, idx, mention.start_idx) {
            if !plain.is_empty() {
                out.push(Segment::Plain(plain));
            }
        }
        out.push(Segment::Span(SpanView::from_mention(mention)));
        idx = mention.end_idx;
    }

    let rest: String = text.chars().skip(idx).collect();
    if !rest.is_empty() {
        out.push(Segment::Plain(rest));
    }
    out
}
