//! Fact definitions - the atomic unit of knowledge.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Relation used by dictionary themes to map a word to its translation.
pub const HAS_TRANSLATION: &str = "<_hasTranslation>";

/// Relation attaching a human-readable label to an entity.
pub const LABEL: &str = "rdfs:label";

/// A subject/relation/object triple with an optional provenance id.
///
/// Two facts are equal when subject, relation and object match; the id is
/// carried along but never compared or hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    subject: String,
    relation: String,
    object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl Fact {
    /// Create a fact without an id.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
            id: None,
        }
    }

    /// Attach a provenance id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    #[must_use]
    pub fn object(&self) -> &str {
        &self.object
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// True if this fact carries the given relation and object.
    pub(crate) fn same_predicate_object(&self, relation: &str, object: &str) -> bool {
        self.relation == relation && self.object == object
    }
}

impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.relation == other.relation
            && self.object == other.object
    }
}

impl Eq for Fact {}

impl Hash for Fact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subject.hash(state);
        self.relation.hash(state);
        self.object.hash(state);
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(id) = &self.id {
            write!(f, "{id} ")?;
        }
        write!(f, "{} {} {}", self.subject, self.relation, self.object)
    }
}

/// Returns true for language codes that count as English.
#[must_use]
pub fn is_english(language: &str) -> bool {
    matches!(language, "en" | "eng")
}
