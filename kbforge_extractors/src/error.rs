use std::path::PathBuf;

use kbforge_core::ThemeError;
use thiserror::Error;

/// Errors raised while resolving or assembling a pipeline.
///
/// All of them are detected before any extractor runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Theme {theme} is produced by both {first} and {second}")]
    DuplicateProducer {
        theme: String,
        first: String,
        second: String,
    },

    #[error("Extractors form a dependency cycle: {}", extractors.join(", "))]
    Cycle { extractors: Vec<String> },

    #[error("Unknown extractor: {0}")]
    UnknownExtractor(String),

    #[error("Cannot create output folder {}: {source}", path.display())]
    OutputFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Theme(#[from] ThemeError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
