//! Translates foreign labels through the dictionary theme.

use std::sync::Arc;

use kbforge_core::{LABEL, Theme, ThemeError, ThemeGroup, ThemeRegistry};
use tracing::info;

use super::dictionary::DICTIONARY;
use crate::extractor::{ExtractionContext, Extractor, ThemeDef};

pub const FOREIGN_LABELS: ThemeDef = ThemeDef::new(
    "_foreignLabels",
    "Labels of entities in languages other than English",
    ThemeGroup::Multilingual,
);
pub const TRANSLATED_LABELS: ThemeDef = ThemeDef::new(
    "yagoTranslatedLabels",
    "English labels obtained by translating foreign labels",
    ThemeGroup::Multilingual,
);

/// For every `rdfs:label` fact whose object has a dictionary entry, writes
/// the same entity with the translated label. Labels without a translation
/// are dropped.
pub struct TranslationExtractor {
    dictionary: Arc<Theme>,
    foreign_labels: Arc<Theme>,
    translated: Arc<Theme>,
}

impl TranslationExtractor {
    pub const NAME: &'static str = "TranslationExtractor";

    pub fn new(themes: &ThemeRegistry) -> Result<Self, ThemeError> {
        Ok(Self {
            dictionary: DICTIONARY.resolve(themes)?,
            foreign_labels: FOREIGN_LABELS.resolve(themes)?,
            translated: TRANSLATED_LABELS.resolve(themes)?,
        })
    }
}

impl Extractor for TranslationExtractor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input(&self) -> Vec<Arc<Theme>> {
        vec![Arc::clone(&self.dictionary), Arc::clone(&self.foreign_labels)]
    }

    fn output(&self) -> Vec<Arc<Theme>> {
        vec![Arc::clone(&self.translated)]
    }

    fn extract(&self, _context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        let dictionary = self.dictionary.translation_view()?;
        info!("Translating labels with {} dictionary entries", dictionary.len());

        let (mut translated, mut untranslated) = (0_usize, 0_usize);
        for fact in self.foreign_labels.iter()? {
            let fact = fact?;
            if fact.relation() != LABEL {
                continue;
            }
            match dictionary.get(fact.object()) {
                Some(translation) => {
                    self.translated
                        .write(&kbforge_core::Fact::new(fact.subject(), LABEL, translation))?;
                    translated += 1;
                }
                None => untranslated += 1,
            }
        }
        info!("Translated {translated} labels, {untranslated} without dictionary entry");
        Ok(())
    }
}
