//! Registry of themes, keyed by name.
//!
//! One registry is built per pipeline run and shared by reference with every
//! component that needs to look themes up. Insertion happens under a single
//! mutex, so concurrent registration from several extractors is safe.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Result, ThemeError};
use crate::theme::{Theme, ThemeGroup};

#[derive(Debug, Default)]
pub struct ThemeRegistry {
    themes: Mutex<BTreeMap<String, Arc<Theme>>>,
}

impl ThemeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Arc<Theme>>>> {
        self.themes
            .lock()
            .map_err(|_| ThemeError::LockPoisoned("<registry>".to_string()))
    }

    /// Create a theme in its default group.
    pub fn create(&self, name: &str, description: &str) -> Result<Arc<Theme>> {
        self.create_in_group(name, description, ThemeGroup::default_for(name))
    }

    /// Create a theme. Fails if the name is taken.
    pub fn create_in_group(&self, name: &str, description: &str, group: ThemeGroup) -> Result<Arc<Theme>> {
        let mut themes = self.lock()?;
        if themes.contains_key(name) {
            return Err(ThemeError::Duplicate(name.to_string()));
        }
        debug!("Registering theme {name} ({group})");
        let theme = Arc::new(Theme::new(name.to_string(), description.to_string(), group));
        themes.insert(name.to_string(), Arc::clone(&theme));
        Ok(theme)
    }

    /// Create the theme `base_language`.
    pub fn create_localized(
        &self,
        base: &str,
        language: &str,
        description: &str,
        group: ThemeGroup,
    ) -> Result<Arc<Theme>> {
        self.create_in_group(&format!("{base}_{language}"), description, group)
    }

    /// Return the theme with this name, creating it if needed.
    pub fn get_or_create(&self, name: &str, description: &str, group: ThemeGroup) -> Result<Arc<Theme>> {
        let mut themes = self.lock()?;
        let theme = themes
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Theme::new(name.to_string(), description.to_string(), group)));
        Ok(Arc::clone(theme))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Theme>> {
        self.lock().ok()?.get(name).cloned()
    }

    /// All themes, ordered by name.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Theme>> {
        self.lock()
            .map(|themes| themes.values().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map(|themes| themes.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unbind every theme. Fails on the first theme still being written.
    pub fn forget_all_bindings(&self) -> Result<()> {
        for theme in self.all() {
            theme.unbind()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_duplicate_names_are_rejected() {
        let registry = ThemeRegistry::new();
        let first = registry.create("T", "first").unwrap();
        let result = registry.create("T", "second");
        assert!(matches!(result, Err(ThemeError::Duplicate(name)) if name == "T"));

        let found = registry.get("T").unwrap();
        assert!(Arc::ptr_eq(&first, &found));
        assert_eq!(found.description(), "first");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_returns_existing() {
        let registry = ThemeRegistry::new();
        let a = registry.get_or_create("_dictionary", "dict", ThemeGroup::Multilingual).unwrap();
        let b = registry.get_or_create("_dictionary", "other", ThemeGroup::Core).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.group(), ThemeGroup::Multilingual);
    }

    #[test]
    fn test_localized_themes() {
        let registry = ThemeRegistry::new();
        let german = registry
            .create_localized("yagoLabels", "de", "labels", ThemeGroup::Multilingual)
            .unwrap();
        assert_eq!(german.name(), "yagoLabels_de");
        assert_eq!(german.language(), Some("de"));
    }

    #[test]
    fn test_all_is_sorted() {
        let registry = ThemeRegistry::new();
        registry.create("b", "").unwrap();
        registry.create("a", "").unwrap();
        registry.create("c", "").unwrap();
        let names: Vec<String> = registry.all().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_concurrent_creation_yields_one_theme() {
        let registry = Arc::new(ThemeRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.create("shared", "").is_ok())
            })
            .collect();
        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(created, 1);
        assert_eq!(registry.len(), 1);
    }
}
