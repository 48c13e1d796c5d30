//! Mentions: single occurrences of an entity in the source text

use super::entity::EntityId;
use serde::{Deserialize, Serialize};

/// A half-open character range `[start_idx, end_idx)` in the source text,
/// together with the surface form it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(alias = "startIdx")]
    pub start_idx: usize,
    #[serde(alias = "endIdx")]
    pub end_idx: usize,
}

impl Span {
    pub fn new(text: impl Into<String>, start_idx: usize, end_idx: usize) -> Self {
        Self {
            text: text.into(),
            start_idx,
            end_idx,
        }
    }

    pub fn key(&self) -> MentionKey {
        MentionKey::new(self.start_idx, self.end_idx)
    }

    /// True if the range is empty or inverted.
    pub fn is_empty(&self) -> bool {
        self.end_idx <= self.start_idx
    }
}

/// Identity of a mention: its character range.
///
/// Mention spans are mutually exclusive within a document, so the range alone
/// identifies one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MentionKey {
    pub start_idx: usize,
    pub end_idx: usize,
}

impl MentionKey {
    pub fn new(start_idx: usize, end_idx: usize) -> Self {
        Self { start_idx, end_idx }
    }

    /// Half-open interval intersection.
    pub fn overlaps(&self, other: &MentionKey) -> bool {
        self.start_idx < other.end_idx && other.start_idx < self.end_idx
    }
}

impl std::fmt::Display for MentionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start_idx, self.end_idx)
    }
}

/// One occurrence of an entity in the source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Canonical entity this occurrence currently points to
    pub url: EntityId,
    /// Surface form
    pub text: String,
    #[serde(alias = "startIdx")]
    pub start_idx: usize,
    #[serde(alias = "endIdx")]
    pub end_idx: usize,
    #[serde(default)]
    pub label: String,
    /// `None` marks an ungrounded literal
    #[serde(default)]
    pub description: Option<String>,
}

impl Mention {
    /// Create an ungrounded mention for a span.
    pub fn literal(url: EntityId, span: &Span) -> Self {
        Self {
            url,
            text: span.text.clone(),
            start_idx: span.start_idx,
            end_idx: span.end_idx,
            label: span.text.clone(),
            description: None,
        }
    }

    pub fn key(&self) -> MentionKey {
        MentionKey::new(self.start_idx, self.end_idx)
    }

    pub fn is_grounded(&self) -> bool {
        self.description.is_some()
    }

    /// View identifier of the text span rendering this mention:
    /// `start_idx:end_idx:url`.
    pub fn span_id(&self) -> String {
        format!("{}:{}:{}", self.start_idx, self.end_idx, self.url)
    }
}
