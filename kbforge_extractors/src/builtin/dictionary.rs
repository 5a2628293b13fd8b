//! Turns a raw word list into a dictionary theme.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use kbforge_core::{Fact, HAS_TRANSLATION, Theme, ThemeError, ThemeGroup, ThemeRegistry};
use tracing::{debug, info};

use super::literal;
use crate::extractor::{ExtractionContext, Extractor, ThemeDef};

pub const DICTIONARY: ThemeDef = ThemeDef::new(
    "_dictionary",
    "Maps foreign words to their English translation",
    ThemeGroup::Multilingual,
);

/// Raw word list read when no input file is given explicitly.
pub const DEFAULT_WORD_LIST: &str = "dictionary.txt";

/// Reads `language \t word \t translation` lines and writes one
/// `"word"@language <_hasTranslation> "translation"@eng` fact per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub struct DictionaryExtractor {
    raw_input: Option<PathBuf>,
    dictionary: Arc<Theme>,
}

impl DictionaryExtractor {
    pub const NAME: &'static str = "DictionaryExtractor";

    pub fn new(themes: &ThemeRegistry, raw_input: Option<&Path>) -> Result<Self, ThemeError> {
        Ok(Self {
            raw_input: raw_input.map(Path::to_path_buf),
            dictionary: DICTIONARY.resolve(themes)?,
        })
    }

    fn parse_line(line: &str) -> Option<anyhow::Result<Fact>> {
        let line = line.trim_end();
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }
        let mut columns = line.split('\t');
        let parsed = match (columns.next(), columns.next(), columns.next(), columns.next()) {
            (Some(language), Some(word), Some(translation), None)
                if !language.is_empty() && !word.is_empty() && !translation.is_empty() =>
            {
                Ok(Fact::new(
                    literal(word, Some(language)),
                    HAS_TRANSLATION,
                    literal(translation, Some("eng")),
                ))
            }
            _ => Err(anyhow::anyhow!("expected 'language<TAB>word<TAB>translation', got '{line}'")),
        };
        Some(parsed)
    }
}

impl Extractor for DictionaryExtractor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn output(&self) -> Vec<Arc<Theme>> {
        vec![Arc::clone(&self.dictionary)]
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        let source = self
            .raw_input
            .clone()
            .unwrap_or_else(|| context.input_folder.join(DEFAULT_WORD_LIST));
        info!("Reading word list {}", source.display());

        let file = std::fs::File::open(&source)
            .with_context(|| format!("Cannot open word list {}", source.display()))?;
        let mut entries = 0_usize;
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let Some(fact) = Self::parse_line(&line) else {
                continue;
            };
            let fact = fact.with_context(|| format!("{}:{}", source.display(), number + 1))?;
            debug!("Dictionary entry: {fact}");
            self.dictionary.write(&fact)?;
            entries += 1;
        }
        info!("Wrote {entries} dictionary entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let fact = DictionaryExtractor::parse_line("de\tHaus\thouse").unwrap().unwrap();
        assert_eq!(fact.subject(), "\"Haus\"@de");
        assert_eq!(fact.relation(), HAS_TRANSLATION);
        assert_eq!(fact.object(), "\"house\"@eng");

        assert!(DictionaryExtractor::parse_line("# comment").is_none());
        assert!(DictionaryExtractor::parse_line("   ").is_none());
        assert!(DictionaryExtractor::parse_line("de\tHaus").unwrap().is_err());
        assert!(DictionaryExtractor::parse_line("de\t\thouse").unwrap().is_err());
    }
}
