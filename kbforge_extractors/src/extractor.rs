//! The extractor contract.

use std::path::Path;
use std::sync::Arc;

use kbforge_core::{Theme, ThemeError, ThemeGroup, ThemeRegistry};

/// What an extractor sees while it runs.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    /// Folder holding raw inputs and themes not produced in this run.
    pub input_folder: &'a Path,
}

/// A pipeline stage: reads its input themes and writes its output themes.
///
/// The pipeline opens every output theme before `extract` runs and closes
/// (or, on failure, aborts) them afterwards; every input theme is bound and
/// readable by then. `extract` only calls `Theme::write` on its outputs and
/// the read operations on its inputs.
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    /// Themes this extractor reads.
    fn input(&self) -> Vec<Arc<Theme>> {
        Vec::new()
    }

    /// Themes this extractor writes.
    fn output(&self) -> Vec<Arc<Theme>>;

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()>;
}

/// Static description of a theme an extractor declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeDef {
    pub name: &'static str,
    pub description: &'static str,
    pub group: ThemeGroup,
}

impl ThemeDef {
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, group: ThemeGroup) -> Self {
        Self {
            name,
            description,
            group,
        }
    }

    /// The registry's theme of this name, created on first use.
    pub fn resolve(&self, themes: &ThemeRegistry) -> Result<Arc<Theme>, ThemeError> {
        themes.get_or_create(self.name, self.description, self.group)
    }
}
