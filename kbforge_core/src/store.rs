//! In-memory indexed materialization of a fact file.
//!
//! # Duplicate policy
//! A store has set semantics: a fact that appears several times in the file
//! (under subject/relation/object equality) is kept once, with the id of its
//! first occurrence. `len()` counts distinct facts. Raw iteration over a theme
//! (`Theme::iter`) still yields every line, duplicates included.
//!
//! # Fast loading
//! A fast load builds only the subject index and skips the id consistency
//! check. A full load additionally builds the subject -> relation index and
//! rejects files in which one id labels two different facts. Relation-scoped
//! lookups (`get_object`, `contains_subject_with_relation`) answer the same
//! on both, but scan all facts of the subject on a fast store.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::codec::FactReader;
use crate::error::StoreError;
use crate::fact::{Fact, HAS_TRANSLATION};

/// Facts missing from and extra in a store, relative to a reference store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactDiff {
    /// Facts of the reference store that this store lacks.
    pub missing: Vec<Fact>,
    /// Facts of this store that the reference store lacks.
    pub extra: Vec<Fact>,
}

impl FactDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// An immutable, indexed set of facts.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    /// Distinct facts in first-occurrence file order.
    facts: Vec<Fact>,
    by_subject: HashMap<String, Vec<usize>>,
    /// subject -> relation -> positions; absent on fast stores.
    by_relation: Option<HashMap<String, HashMap<String, Vec<usize>>>>,
}

impl FactStore {
    /// Build a full store from facts already in memory.
    #[must_use]
    pub fn from_facts(facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut store = Self {
            by_relation: Some(HashMap::new()),
            ..Self::default()
        };
        for fact in facts {
            store.insert(fact);
        }
        store
    }

    /// Load a fact file. The whole load fails on the first malformed record.
    pub fn load(path: &Path, fast: bool) -> Result<Self, StoreError> {
        debug!("Loading facts from {} (fast: {fast})", path.display());
        let mut store = Self {
            by_relation: if fast { None } else { Some(HashMap::new()) },
            ..Self::default()
        };
        let mut ids: HashMap<String, usize> = HashMap::new();
        let mut reader = FactReader::open(path)?;

        while let Some(fact) = reader.next() {
            let fact = fact?;
            if !fast {
                if let Some(id) = fact.id() {
                    if let Some(&pos) = ids.get(id) {
                        if store.facts[pos] != fact {
                            return Err(StoreError::malformed(
                                path,
                                reader.line(),
                                format!("id {id} already labels {}", store.facts[pos]),
                            ));
                        }
                    }
                }
            }
            let id = fact.id().map(str::to_string);
            if let Some(pos) = store.insert(fact) {
                if let Some(id) = id {
                    ids.entry(id).or_insert(pos);
                }
            }
        }

        debug!("Loaded {} facts from {}", store.len(), path.display());
        Ok(store)
    }

    /// Insert a fact unless an equal one is present. Returns its position if inserted.
    fn insert(&mut self, fact: Fact) -> Option<usize> {
        if self.contains(&fact) {
            return None;
        }
        let pos = self.facts.len();
        self.by_subject
            .entry(fact.subject().to_string())
            .or_default()
            .push(pos);
        if let Some(index) = &mut self.by_relation {
            index
                .entry(fact.subject().to_string())
                .or_default()
                .entry(fact.relation().to_string())
                .or_default()
                .push(pos);
        }
        self.facts.push(fact);
        Some(pos)
    }

    /// True if the store was loaded without the relation index.
    #[must_use]
    pub const fn is_fast(&self) -> bool {
        self.by_relation.is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// All distinct facts in first-occurrence order.
    pub fn facts(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// All facts with the given subject, in file order.
    pub fn facts_about<'a>(&'a self, subject: &str) -> impl Iterator<Item = &'a Fact> + use<'a> {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .map(|&pos| &self.facts[pos])
    }

    /// All facts with the given subject and relation, in file order.
    pub fn facts_with<'a, 'r>(
        &'a self,
        subject: &str,
        relation: &'r str,
    ) -> Box<dyn Iterator<Item = &'a Fact> + 'r>
    where
        'a: 'r,
    {
        match &self.by_relation {
            Some(index) => Box::new(
                index
                    .get(subject)
                    .and_then(|relations| relations.get(relation))
                    .into_iter()
                    .flatten()
                    .map(|&pos| &self.facts[pos]),
            ),
            None => Box::new(
                self.facts_about(subject)
                    .filter(move |fact| fact.relation() == relation),
            ),
        }
    }

    #[must_use]
    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts_about(fact.subject())
            .any(|f| f.same_predicate_object(fact.relation(), fact.object()))
    }

    #[must_use]
    pub fn contains_subject_with_relation(&self, subject: &str, relation: &str) -> bool {
        self.facts_with(subject, relation).next().is_some()
    }

    /// The object of the first fact (in file order) with this subject and relation.
    #[must_use]
    pub fn get_object(&self, subject: &str, relation: &str) -> Option<&str> {
        self.facts_with(subject, relation).next().map(Fact::object)
    }

    /// Facts of `reference` missing here, and facts here missing from `reference`.
    #[must_use]
    pub fn diff(&self, reference: &Self) -> FactDiff {
        FactDiff {
            missing: reference
                .facts()
                .filter(|fact| !self.contains(fact))
                .cloned()
                .collect(),
            extra: self
                .facts()
                .filter(|fact| !reference.contains(fact))
                .cloned()
                .collect(),
        }
    }

    /// True if both stores hold the same set of facts. Differences are logged.
    #[must_use]
    pub fn check_equal(&self, other: &Self) -> bool {
        let diff = self.diff(other);
        for fact in &diff.missing {
            warn!("Missing fact: {fact}");
        }
        for fact in &diff.extra {
            warn!("Unexpected fact: {fact}");
        }
        diff.is_empty()
    }
}

/// Read-only dictionary over the `<_hasTranslation>` facts of a store.
///
/// Holds its own handle on the store, so it stays valid after the owning
/// theme drops its cache.
#[derive(Debug, Clone)]
pub struct TranslationView {
    store: std::sync::Arc<FactStore>,
    len: usize,
}

impl TranslationView {
    #[must_use]
    pub fn new(store: std::sync::Arc<FactStore>) -> Self {
        let len = store
            .by_subject
            .keys()
            .filter(|subject| store.contains_subject_with_relation(subject, HAS_TRANSLATION))
            .count();
        Self { store, len }
    }

    /// Translation of a word, the first one in file order if several exist.
    #[must_use]
    pub fn get(&self, word: &str) -> Option<&str> {
        self.store.get_object(word, HAS_TRANSLATION)
    }

    #[must_use]
    pub fn contains_key(&self, word: &str) -> bool {
        self.store.contains_subject_with_relation(word, HAS_TRANSLATION)
    }

    /// Number of words that have a translation.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
