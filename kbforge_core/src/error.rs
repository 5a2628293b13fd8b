use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing a persisted fact file.
///
/// These are data errors: the caller may retry once the input is fixed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record in {} at line {line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Cannot write fact to {}: {reason}", path.display())]
    InvalidFact { path: PathBuf, reason: String },

    #[error("Unknown fact file format: {}", .0.display())]
    UnknownFormat(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Errors raised by theme lifecycle operations and the theme registry.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Duplicate theme: {0}")]
    Duplicate(String),

    #[error("Already writing into theme {0}")]
    AlreadyWriting(String),

    #[error("Theme {theme} already written to {}", file.display())]
    AlreadyWritten { theme: String, file: PathBuf },

    #[error(
        "Theme {0} is not open for writing. Maybe it was not declared as an output of the extractor?"
    )]
    NotWriting(String),

    #[error(
        "Theme {0} has not yet been assigned to a file. Maybe it was not declared as an input of the extractor?"
    )]
    Unbound(String),

    #[error("Theme {0} is currently being written")]
    CurrentlyWriting(String),

    #[error("Cannot find theme {theme} in {}", folder.display())]
    NotFound { theme: String, folder: PathBuf },

    #[error("Theme {theme} is already assigned to {}, cannot assign it to {}", file.display(), requested.display())]
    AlreadyBound {
        theme: String,
        file: PathBuf,
        requested: PathBuf,
    },

    #[error("Lock poisoned on theme {0}")]
    LockPoisoned(String),

    #[error("Theme {theme}: {source}")]
    Store {
        theme: String,
        #[source]
        source: StoreError,
    },
}

impl ThemeError {
    /// True when the error signals a wiring defect in the caller rather than
    /// missing or corrupt data. Usage errors should not be retried.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::Duplicate(_)
                | Self::AlreadyWriting(_)
                | Self::AlreadyWritten { .. }
                | Self::NotWriting(_)
                | Self::Unbound(_)
                | Self::CurrentlyWriting(_)
                | Self::AlreadyBound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ThemeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_errors_are_classified() {
        assert!(ThemeError::NotWriting("t".to_string()).is_usage_error());
        assert!(ThemeError::Duplicate("t".to_string()).is_usage_error());

        let missing = ThemeError::NotFound {
            theme: "t".to_string(),
            folder: PathBuf::from("/data"),
        };
        assert!(!missing.is_usage_error());
    }

    #[test]
    fn test_error_display_names_the_theme() {
        let error = ThemeError::Store {
            theme: "yagoFacts".to_string(),
            source: StoreError::malformed("/data/yagoFacts.tsv", 3, "expected 4 columns"),
        };
        let display = format!("{error}");
        assert!(display.contains("yagoFacts"));
        assert!(display.contains("line 3"));
    }
}
