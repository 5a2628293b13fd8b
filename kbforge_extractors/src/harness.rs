//! Runs single extractors against fixed inputs and compares their output
//! with gold-standard themes.
//!
//! A test case is a directory named after the extractor under test, holding
//! `in/` (input themes and an optional raw input file `datainput.txt`) and
//! `out/` (one gold file per output theme).

use std::path::{Path, PathBuf};

use anyhow::Context;
use kbforge_core::{FactDiff, FactStore, ThemeRegistry};
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::pipeline::{ExtractorOutcome, Pipeline};
use crate::registry::ExtractorRegistry;

pub const INPUT_FOLDER: &str = "in";
pub const GOLD_FOLDER: &str = "out";
pub const RAW_INPUT_FILE: &str = "datainput.txt";

#[derive(Debug)]
pub struct ThemeMismatch {
    pub theme: String,
    pub diff: FactDiff,
}

#[derive(Debug)]
pub enum CaseFailure {
    /// The case directory has no `in/` or no `out/` folder.
    MissingFolder(PathBuf),
    /// No extractor is registered under the case name.
    UnknownExtractor,
    /// The extractor could not be built or did not run to completion.
    Execution(String),
    /// The gold folder has no file for an output theme.
    MissingGold { theme: String },
    Mismatch(Vec<ThemeMismatch>),
}

impl std::fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFolder(path) => write!(f, "missing folder {}", path.display()),
            Self::UnknownExtractor => write!(f, "unknown extractor"),
            Self::Execution(message) => write!(f, "execution failed: {message}"),
            Self::MissingGold { theme } => write!(f, "no gold standard for {theme}"),
            Self::Mismatch(mismatches) => {
                let themes: Vec<&str> = mismatches.iter().map(|m| m.theme.as_str()).collect();
                write!(f, "output differs from gold standard in {}", themes.join(", "))
            }
        }
    }
}

#[derive(Debug)]
pub enum CaseStatus {
    Passed,
    Failed(CaseFailure),
}

#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub status: CaseStatus,
}

impl CaseReport {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.status, CaseStatus::Passed)
    }
}

#[derive(Debug, Default)]
pub struct HarnessReport {
    pub cases: Vec<CaseReport>,
}

impl HarnessReport {
    #[must_use]
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}/{} tests succeeded", self.passed(), self.total())
    }

    #[must_use]
    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }
}

pub struct TestHarness<'a> {
    extractors: &'a ExtractorRegistry,
    cases_folder: PathBuf,
    output_folder: PathBuf,
    header: String,
    fast: bool,
}

impl<'a> TestHarness<'a> {
    pub fn new(
        extractors: &'a ExtractorRegistry,
        cases_folder: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractors,
            cases_folder: cases_folder.into(),
            output_folder: output_folder.into(),
            header: "Test run".to_string(),
            fast: false,
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Load produced and gold themes without full validation.
    #[must_use]
    pub const fn with_fast_load(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    /// Run every case directory, in name order.
    ///
    /// Only a missing or unreadable cases folder is an error; failing cases
    /// are recorded and the remaining cases still run.
    pub fn run_all(&self) -> anyhow::Result<HarnessReport> {
        let mut cases = Vec::new();
        for entry in std::fs::read_dir(&self.cases_folder)
            .with_context(|| format!("Cannot read test cases in {}", self.cases_folder.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                cases.push(path);
            }
        }
        cases.sort();
        info!("Found {} test cases in {}", cases.len(), self.cases_folder.display());

        let mut report = HarnessReport::default();
        for case in cases {
            let case_report = self.run_case(&case);
            match &case_report.status {
                CaseStatus::Passed => info!("Test {} passed", case_report.name),
                CaseStatus::Failed(failure) => error!("Test {} failed: {failure}", case_report.name),
            }
            report.cases.push(case_report);
        }
        info!("{}", report.summary());
        Ok(report)
    }

    /// Run one case directory in a fresh theme registry.
    pub fn run_case(&self, case: &Path) -> CaseReport {
        let name = case
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Testing {name}");
        let status = match self.evaluate(&name, case) {
            Ok(()) => CaseStatus::Passed,
            Err(failure) => CaseStatus::Failed(failure),
        };
        CaseReport { name, status }
    }

    fn evaluate(&self, name: &str, case: &Path) -> Result<(), CaseFailure> {
        let input_folder = case.join(INPUT_FOLDER);
        let gold_folder = case.join(GOLD_FOLDER);
        for folder in [&input_folder, &gold_folder] {
            if !folder.is_dir() {
                return Err(CaseFailure::MissingFolder(folder.clone()));
            }
        }
        let raw_input = Some(input_folder.join(RAW_INPUT_FILE)).filter(|p| p.is_file());

        let themes = ThemeRegistry::new();
        let extractor = match self.extractors.for_name(name, raw_input.as_deref(), &themes) {
            Ok(extractor) => extractor,
            Err(PipelineError::UnknownExtractor(_)) => return Err(CaseFailure::UnknownExtractor),
            Err(e) => return Err(CaseFailure::Execution(e.to_string())),
        };
        let outputs = extractor.output();

        let output_folder = self.output_folder.join(name);
        let pipeline = Pipeline::new(vec![extractor]).map_err(|e| CaseFailure::Execution(e.to_string()))?;
        let report = pipeline
            .run(&input_folder, &output_folder, &self.header)
            .map_err(|e| CaseFailure::Execution(e.to_string()))?;
        if let Some(failed) = report.failed().next() {
            let message = match &failed.outcome {
                ExtractorOutcome::Failed { error, .. } => format!("{error:#}"),
                ExtractorOutcome::Skipped { blocked_by, theme } => {
                    format!("{blocked_by} did not produce {theme}")
                }
                ExtractorOutcome::Succeeded => String::new(),
            };
            return Err(CaseFailure::Execution(message));
        }

        let mut mismatches = Vec::new();
        for theme in outputs {
            let gold_file = theme
                .find_file_in_folder(&gold_folder)
                .ok_or_else(|| CaseFailure::MissingGold {
                    theme: theme.name().to_string(),
                })?;
            let gold = FactStore::load(&gold_file, self.fast)
                .map_err(|e| CaseFailure::Execution(e.to_string()))?;
            let produced = theme
                .fact_store(self.fast)
                .map_err(|e| CaseFailure::Execution(e.to_string()))?;
            if !produced.check_equal(&gold) {
                warn!("Theme {theme} differs from {}", gold_file.display());
                mismatches.push(ThemeMismatch {
                    theme: theme.name().to_string(),
                    diff: produced.diff(&gold),
                });
            }
        }
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(CaseFailure::Mismatch(mismatches))
        }
    }
}
