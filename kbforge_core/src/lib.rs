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

//! Named fact sets and their indexed, file-backed store.
//!
//! - [`Fact`]: a subject/relation/object triple
//! - [`FactStore`]: an immutable, indexed set of facts loaded from a file
//! - [`Theme`]: a named fact set with a write-once/read-many lifecycle
//! - [`ThemeRegistry`]: the name -> theme table of one pipeline run

mod cache;
pub mod codec;
mod error;
mod fact;
mod registry;
mod store;
mod theme;

pub use codec::{FactReader, FactWriter, FileFormat};
pub use error::{Result, StoreError, ThemeError};
pub use fact::{Fact, HAS_TRANSLATION, LABEL, is_english};
pub use registry::ThemeRegistry;
pub use store::{FactDiff, FactStore, TranslationView};
pub use theme::{EXPORT_PREFIX, Theme, ThemeGroup, ThemeState};
