//! Entity representation: canonical referents owning one or more mentions

use super::mention::{Mention, MentionKey, Span};
use serde::{Deserialize, Serialize};

/// Description carried by entities created from a bare text selection
pub const LITERAL_DESCRIPTION: &str = "literal";

/// Canonical identity of an entity: its url
///
/// Serializes as a plain string. No two entities in a graph share one id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an EntityId from a url
    pub fn from_string(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Synthetic id for an ungrounded literal: `namespace + percent-encoded text`
    pub fn literal(namespace: &str, text: &str) -> Self {
        Self(format!("{}{}", namespace, urlencoding::encode(text)))
    }

    /// Get the inner url
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A canonical node representing one real-world referent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Primary key
    pub url: EntityId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    /// Occurrences in the source text. Never empty for an entity stored in a graph.
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

impl Entity {
    /// Create an entity with no mentions yet
    pub fn new(url: impl Into<EntityId>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: Some(label.into()),
            description: None,
            score: None,
            mentions: Vec::new(),
        }
    }

    /// Create an ungrounded entity owning exactly one mention of `span`
    pub fn literal(namespace: &str, span: &Span) -> Self {
        let url = EntityId::literal(namespace, &span.text);
        let mention = Mention::literal(url.clone(), span);
        Self {
            url,
            label: Some(span.text.clone()),
            description: Some(LITERAL_DESCRIPTION.to_string()),
            score: None,
            mentions: vec![mention],
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Add a mention, regrounding it to this entity
    pub fn with_mention(mut self, mention: Mention) -> Self {
        self.adopt(mention);
        self
    }

    /// Take ownership of a mention, overwriting its url, label and description
    /// with this entity's. Mentions of a literal entity stay ungrounded.
    pub fn adopt(&mut self, mut mention: Mention) {
        mention.url = self.url.clone();
        mention.label = self.display_label().to_string();
        mention.description = if self.is_literal() {
            None
        } else {
            self.description.clone()
        };
        self.mentions.push(mention);
    }

    /// Remove and return the mention covering `key`
    pub fn take_mention(&mut self, key: &MentionKey) -> Option<Mention> {
        let idx = self.mentions.iter().position(|m| m.key() == *key)?;
        Some(self.mentions.remove(idx))
    }

    pub fn has_mention(&self, key: &MentionKey) -> bool {
        self.mentions.iter().any(|m| m.key() == *key)
    }

    /// Ungrounded: no label, or a synthetic literal description
    pub fn is_literal(&self) -> bool {
        self.label.is_none() || self.description.as_deref() == Some(LITERAL_DESCRIPTION)
    }

    /// Label, falling back to the first mention's surface form, then the url
    pub fn display_label(&self) -> &str {
        match (&self.label, self.mentions.first()) {
            (Some(label), _) => label,
            (None, Some(m)) => &m.text,
            (None, None) => self.url.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_url_is_percent_encoded() {
        let id = EntityId::literal("http://kgsync.local/literal/", "New York");
        assert_eq!(id.as_str(), "http://kgsync.local/literal/New%20York");
    }

    #[test]
    fn literal_entity_owns_one_ungrounded_mention() {
        let e = Entity::literal("lit:", &Span::new("Berlin", 10, 16));
        assert_eq!(e.url.as_str(), "lit:Berlin");
        assert_eq!(e.label.as_deref(), Some("Berlin"));
        assert_eq!(e.description.as_deref(), Some(LITERAL_DESCRIPTION));
        assert!(e.is_literal());
        assert_eq!(e.mentions.len(), 1);
        assert_eq!(e.mentions[0].url, e.url);
        assert!(e.mentions[0].description.is_none());
    }

    #[test]
    fn adopt_regrounds_mention() {
        let mention = Mention::literal(EntityId::from("lit:Paris"), &Span::new("Paris", 0, 5));
        let e = Entity::new("Q90", "Paris")
            .with_description("capital of France")
            .with_mention(mention);

        let m = &e.mentions[0];
        assert_eq!(m.url.as_str(), "Q90");
        assert_eq!(m.label, "Paris");
        assert_eq!(m.description.as_deref(), Some("capital of France"));
        assert!(!e.is_literal());
    }

    #[test]
    fn take_mention_by_key() {
        let mut e = Entity::new("Q90", "Paris")
            .with_mention(Mention::literal("Q90".into(), &Span::new("Paris", 0, 5)))
            .with_mention(Mention::literal("Q90".into(), &Span::new("Paris", 20, 25)));

        let taken = e.take_mention(&MentionKey::new(0, 5));
        assert!(taken.is_some());
        assert_eq!(e.mentions.len(), 1);
        assert!(e.take_mention(&MentionKey::new(0, 5)).is_none());
    }

    #[test]
    fn display_label_falls_back_to_mention_text() {
        let mut e = Entity::new("Q1", "x");
        e.label = None;
        assert_eq!(e.display_label(), "Q1");
        e.mentions.push(Mention::literal("Q1".into(), &Span::new("Weimar", 3, 9)));
        assert_eq!(e.display_label(), "Weimar");
    }
}
