use std::collections::BTreeMap;
use std::path::Path;

use kbforge_core::{ThemeError, ThemeRegistry};
use tracing::{debug, info};

use crate::builtin::{DictionaryExtractor, PatternHardExtractor, TranslationExtractor};
use crate::error::{PipelineError, Result};
use crate::extractor::Extractor;

type Constructor =
    Box<dyn Fn(&ThemeRegistry, Option<&Path>) -> std::result::Result<Box<dyn Extractor>, ThemeError> + Send + Sync>;

/// Table from extractor names to constructors, built once at startup.
pub struct ExtractorRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl ExtractorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in extractor.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PatternHardExtractor::NAME, |themes, _| {
            Ok(Box::new(PatternHardExtractor::new(themes)?))
        });
        registry.register(DictionaryExtractor::NAME, |themes, raw_input| {
            Ok(Box::new(DictionaryExtractor::new(themes, raw_input)?))
        });
        registry.register(TranslationExtractor::NAME, |themes, _| {
            Ok(Box::new(TranslationExtractor::new(themes)?))
        });
        registry
    }

    /// Register a constructor under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&ThemeRegistry, Option<&Path>) -> std::result::Result<Box<dyn Extractor>, ThemeError>
            + Send
            + Sync
            + 'static,
    {
        info!("Registering extractor: {name}");
        self.constructors.insert(name.to_string(), Box::new(constructor));
    }

    /// Build the extractor called `name`, optionally reading `raw_input`.
    ///
    /// Its themes are resolved in `themes`.
    pub fn for_name(
        &self,
        name: &str,
        raw_input: Option<&Path>,
        themes: &ThemeRegistry,
    ) -> Result<Box<dyn Extractor>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| PipelineError::UnknownExtractor(name.to_string()))?;
        debug!("Creating extractor {name}");
        Ok(constructor(themes, raw_input)?)
    }

    /// Build every registered extractor.
    pub fn all(&self, themes: &ThemeRegistry) -> Result<Vec<Box<dyn Extractor>>> {
        self.names()
            .map(|name| self.for_name(name, None, themes))
            .collect()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = ExtractorRegistry::with_builtin();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["DictionaryExtractor", "PatternHardExtractor", "TranslationExtractor"]
        );
    }

    #[test]
    fn test_unknown_name_is_an_explicit_result() {
        let registry = ExtractorRegistry::with_builtin();
        let themes = ThemeRegistry::new();
        let result = registry.for_name("NoSuchExtractor", None, &themes);
        assert!(matches!(result, Err(PipelineError::UnknownExtractor(name)) if name == "NoSuchExtractor"));
    }

    #[test]
    fn test_shared_themes_resolve_to_one_instance() {
        let registry = ExtractorRegistry::with_builtin();
        let themes = ThemeRegistry::new();
        let producer = registry.for_name("DictionaryExtractor", None, &themes).unwrap();
        let consumer = registry.for_name("TranslationExtractor", None, &themes).unwrap();

        let produced = &producer.output()[0];
        assert!(consumer.input().iter().any(|t| std::sync::Arc::ptr_eq(t, produced)));
    }
}
