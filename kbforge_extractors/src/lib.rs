#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod builtin;
mod error;
mod extractor;
mod harness;
mod pipeline;
mod registry;

pub use error::{PipelineError, Result};
pub use extractor::{ExtractionContext, Extractor, ThemeDef};
pub use harness::{
    CaseFailure, CaseReport, CaseStatus, GOLD_FOLDER, HarnessReport, INPUT_FOLDER, RAW_INPUT_FILE,
    TestHarness, ThemeMismatch,
};
pub use pipeline::{ExtractorOutcome, ExtractorReport, Pipeline, PipelineReport};
pub use registry::ExtractorRegistry;
