//! Copies the hand-written pattern themes into the knowledge base.

use std::sync::Arc;

use anyhow::Context;
use kbforge_core::{FactReader, Theme, ThemeError, ThemeGroup, ThemeRegistry};
use tracing::info;

use crate::extractor::{ExtractionContext, Extractor, ThemeDef};

pub const INFOBOX_PATTERNS: ThemeDef = ThemeDef::new(
    "_infoboxPatterns",
    "These are the Wikipedia infobox patterns",
    ThemeGroup::Internal,
);
pub const TITLE_PATTERNS: ThemeDef = ThemeDef::new(
    "_titlePatterns",
    "These are the replacement patterns for Wikipedia titles",
    ThemeGroup::Internal,
);
pub const CATEGORY_PATTERNS: ThemeDef = ThemeDef::new(
    "_categoryPatterns",
    "These are the Wikipedia category patterns",
    ThemeGroup::Internal,
);
pub const DISAMBIGUATION_PATTERNS: ThemeDef = ThemeDef::new(
    "_disambiguationPatterns",
    "Patterns for the disambiguation pages of Wikipedia",
    ThemeGroup::Internal,
);
pub const CONTEXT_PATTERNS: ThemeDef = ThemeDef::new(
    "_extendedContextWikiPatterns",
    "Patterns for extracting keyphrases",
    ThemeGroup::Internal,
);
pub const STRUCTURE_PATTERNS: ThemeDef = ThemeDef::new(
    "_extendedStructureWikiPatterns",
    "Patterns for extracting regular structure from Wikipedia (e.g. links)",
    ThemeGroup::Internal,
);
pub const RULES: ThemeDef = ThemeDef::new(
    "_rules",
    "These are the implication rules of the knowledge base",
    ThemeGroup::Internal,
);

/// Reads each pattern theme from the file of the same name in the input
/// folder and writes it unchanged.
pub struct PatternHardExtractor {
    outputs: Vec<Arc<Theme>>,
}

impl PatternHardExtractor {
    pub const NAME: &'static str = "PatternHardExtractor";

    pub fn new(themes: &ThemeRegistry) -> Result<Self, ThemeError> {
        let outputs = [
            INFOBOX_PATTERNS,
            TITLE_PATTERNS,
            CATEGORY_PATTERNS,
            DISAMBIGUATION_PATTERNS,
            CONTEXT_PATTERNS,
            STRUCTURE_PATTERNS,
            RULES,
        ]
        .iter()
        .map(|def| def.resolve(themes))
        .collect::<Result<_, _>>()?;
        Ok(Self { outputs })
    }
}

impl Extractor for PatternHardExtractor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn output(&self) -> Vec<Arc<Theme>> {
        self.outputs.clone()
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        info!("Copying patterns from {}", context.input_folder.display());
        for theme in &self.outputs {
            let source = theme.find_file_in_folder(context.input_folder).with_context(|| {
                format!(
                    "No pattern file for {theme} in {}",
                    context.input_folder.display()
                )
            })?;
            let mut copied = 0_usize;
            for fact in FactReader::open(&source)? {
                theme.write(&fact?)?;
                copied += 1;
            }
            info!("Copied {copied} facts into {theme}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs_every_pattern_theme() {
        let themes = ThemeRegistry::new();
        let extractor = PatternHardExtractor::new(&themes).unwrap();
        let names: Vec<String> = extractor.output().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "_infoboxPatterns",
                "_titlePatterns",
                "_categoryPatterns",
                "_disambiguationPatterns",
                "_extendedContextWikiPatterns",
                "_extendedStructureWikiPatterns",
                "_rules",
            ]
        );
        assert!(extractor.output().iter().all(|t| t.group() == ThemeGroup::Internal));
    }
}
