//! Built-in extractors.

mod dictionary;
mod pattern;
mod translation;

pub use dictionary::DictionaryExtractor;
pub use pattern::PatternHardExtractor;
pub use translation::TranslationExtractor;

/// Encode text as a string literal, optionally language-tagged.
#[must_use]
pub fn literal(text: &str, language: Option<&str>) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    match language {
        Some(language) => format!("\"{escaped}\"@{language}"),
        None => format!("\"{escaped}\""),
    }
}
