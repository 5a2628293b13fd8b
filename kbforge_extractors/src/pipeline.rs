//! Dependency-ordered execution of extractors.
//!
//! An extractor depends on every extractor that produces one of its input
//! themes. Extractors are grouped into waves: a wave holds every extractor
//! whose producers all ran in earlier waves, and the extractors of one wave
//! run in parallel. A producer's outputs are closed before its wave ends,
//! so a consumer never sees a theme that is still being written.

use std::collections::{BTreeSet, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;

use kbforge_core::Theme;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};
use crate::extractor::{ExtractionContext, Extractor};

/// What became of one extractor in a run.
#[derive(Debug)]
pub enum ExtractorOutcome {
    Succeeded,
    /// `theme` names the theme whose lifecycle call failed, if the failure
    /// was not raised by the extractor body itself.
    Failed {
        theme: Option<String>,
        error: anyhow::Error,
    },
    /// Not run because `blocked_by`, the producer of its input `theme`,
    /// did not succeed.
    Skipped { blocked_by: String, theme: String },
}

#[derive(Debug)]
pub struct ExtractorReport {
    pub extractor: String,
    pub outcome: ExtractorOutcome,
}

/// Outcomes of one run, in schedule order.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub reports: Vec<ExtractorReport>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, ExtractorOutcome::Succeeded))
            .map(|r| r.extractor.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExtractorReport> {
        self.reports
            .iter()
            .filter(|r| !matches!(r.outcome, ExtractorOutcome::Succeeded))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    #[must_use]
    pub fn outcome_of(&self, extractor: &str) -> Option<&ExtractorOutcome> {
        self.reports
            .iter()
            .find(|r| r.extractor == extractor)
            .map(|r| &r.outcome)
    }
}

/// A validated set of extractors together with their schedule.
pub struct Pipeline {
    extractors: Vec<Box<dyn Extractor>>,
    waves: Vec<Vec<usize>>,
    /// Theme name -> index of the extractor producing it.
    producers: HashMap<String, usize>,
}

impl Pipeline {
    /// Build the dependency graph and schedule.
    ///
    /// Fails if two extractors produce the same theme or if the extractors
    /// depend on each other in a cycle. Nothing runs in either case.
    pub fn new(extractors: Vec<Box<dyn Extractor>>) -> Result<Self> {
        let mut producers: HashMap<String, usize> = HashMap::new();
        for (index, extractor) in extractors.iter().enumerate() {
            for theme in extractor.output() {
                match producers.get(theme.name()) {
                    Some(&first) if first != index => {
                        return Err(PipelineError::DuplicateProducer {
                            theme: theme.name().to_string(),
                            first: extractors[first].name().to_string(),
                            second: extractor.name().to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        producers.insert(theme.name().to_string(), index);
                    }
                }
            }
        }

        let dependencies: Vec<BTreeSet<usize>> = extractors
            .iter()
            .map(|extractor| {
                extractor
                    .input()
                    .iter()
                    .filter_map(|theme| producers.get(theme.name()).copied())
                    .collect()
            })
            .collect();

        let waves = Self::schedule(&extractors, &dependencies)?;
        info!(
            "Scheduled {} extractors in {} waves",
            extractors.len(),
            waves.len()
        );
        Ok(Self {
            extractors,
            waves,
            producers,
        })
    }

    fn schedule(
        extractors: &[Box<dyn Extractor>],
        dependencies: &[BTreeSet<usize>],
    ) -> Result<Vec<Vec<usize>>> {
        let mut pending: Vec<usize> = dependencies.iter().map(BTreeSet::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); extractors.len()];
        for (consumer, producers) in dependencies.iter().enumerate() {
            for &producer in producers {
                dependents[producer].push(consumer);
            }
        }

        let mut waves = Vec::new();
        let mut ready: Vec<usize> = (0..extractors.len()).filter(|&i| pending[i] == 0).collect();
        let mut scheduled = 0;
        while !ready.is_empty() {
            scheduled += ready.len();
            let mut next = Vec::new();
            for &producer in &ready {
                for &consumer in &dependents[producer] {
                    pending[consumer] -= 1;
                    if pending[consumer] == 0 {
                        next.push(consumer);
                    }
                }
            }
            next.sort_unstable();
            waves.push(std::mem::replace(&mut ready, next));
        }

        if scheduled < extractors.len() {
            let extractors = (0..extractors.len())
                .filter(|&i| pending[i] > 0)
                .map(|i| extractors[i].name().to_string())
                .collect();
            return Err(PipelineError::Cycle { extractors });
        }
        Ok(waves)
    }

    /// Extractor names in execution order.
    #[must_use]
    pub fn order(&self) -> Vec<&str> {
        self.waves
            .iter()
            .flatten()
            .map(|&i| self.extractors[i].name())
            .collect()
    }

    /// Extractor names grouped by the wave they run in.
    #[must_use]
    pub fn waves(&self) -> Vec<Vec<&str>> {
        self.waves
            .iter()
            .map(|wave| wave.iter().map(|&i| self.extractors[i].name()).collect())
            .collect()
    }

    pub fn extractors(&self) -> &[Box<dyn Extractor>] {
        &self.extractors
    }

    /// Run every extractor, writing outputs to `output_folder`.
    ///
    /// Input themes no extractor of this pipeline produces are bound to
    /// their files in `input_folder` first. A failing extractor does not
    /// stop independent ones; its dependents are skipped.
    pub fn run(&self, input_folder: &Path, output_folder: &Path, header: &str) -> Result<PipelineReport> {
        std::fs::create_dir_all(output_folder).map_err(|source| PipelineError::OutputFolder {
            path: output_folder.to_path_buf(),
            source,
        })?;

        let mut unreadable: Vec<Option<ExtractorOutcome>> =
            self.extractors.iter().map(|e| self.bind_inputs(e.as_ref(), input_folder)).collect();
        let mut succeeded = vec![false; self.extractors.len()];
        let context = ExtractionContext { input_folder };
        let mut report = PipelineReport::default();

        for wave in &self.waves {
            let mut decided = Vec::with_capacity(wave.len());
            let mut runnable = Vec::with_capacity(wave.len());
            for &index in wave {
                if let Some(outcome) = unreadable[index].take() {
                    decided.push((index, outcome));
                } else if let Some(outcome) = self.blocked(index, &succeeded) {
                    decided.push((index, outcome));
                } else {
                    runnable.push(index);
                }
            }

            decided.extend(
                runnable
                    .into_par_iter()
                    .map(|index| {
                        let outcome =
                            Self::run_one(self.extractors[index].as_ref(), &context, output_folder, header);
                        (index, outcome)
                    })
                    .collect::<Vec<_>>(),
            );
            decided.sort_unstable_by_key(|(index, _)| *index);

            for (index, outcome) in decided {
                succeeded[index] = matches!(outcome, ExtractorOutcome::Succeeded);
                report.reports.push(ExtractorReport {
                    extractor: self.extractors[index].name().to_string(),
                    outcome,
                });
            }
        }
        Ok(report)
    }

    /// `Skipped` if a producer of one of the inputs of `index` did not succeed.
    fn blocked(&self, index: usize, succeeded: &[bool]) -> Option<ExtractorOutcome> {
        let extractor = &self.extractors[index];
        let (producer, theme) = extractor.input().iter().find_map(|theme| {
            let producer = *self.producers.get(theme.name())?;
            (!succeeded[producer]).then(|| (producer, theme.name().to_string()))
        })?;
        let blocked_by = self.extractors[producer].name().to_string();
        warn!(
            "Skipping extractor {} because {blocked_by} did not produce {theme}",
            extractor.name()
        );
        Some(ExtractorOutcome::Skipped { blocked_by, theme })
    }

    /// Bind inputs produced outside this pipeline. `None` when all are readable.
    fn bind_inputs(&self, extractor: &dyn Extractor, input_folder: &Path) -> Option<ExtractorOutcome> {
        for theme in extractor.input() {
            if self.producers.contains_key(theme.name()) {
                continue;
            }
            if let Err(e) = theme.bind_to_folder(input_folder) {
                error!("Extractor {} cannot read input {theme}: {e}", extractor.name());
                return Some(ExtractorOutcome::Failed {
                    theme: Some(theme.name().to_string()),
                    error: e.into(),
                });
            }
        }
        None
    }

    fn run_one(
        extractor: &dyn Extractor,
        context: &ExtractionContext<'_>,
        output_folder: &Path,
        header: &str,
    ) -> ExtractorOutcome {
        let outputs = extractor.output();
        info!("Running extractor {}", extractor.name());

        for (opened, theme) in outputs.iter().enumerate() {
            if let Err(e) = theme.open_for_writing(output_folder, header) {
                error!("Extractor {} cannot open {theme}: {e}", extractor.name());
                abort_all(&outputs[..opened]);
                return ExtractorOutcome::Failed {
                    theme: Some(theme.name().to_string()),
                    error: e.into(),
                };
            }
        }

        let extracted = catch_unwind(AssertUnwindSafe(|| extractor.extract(context)))
            .unwrap_or_else(|payload| Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()))));
        if let Err(e) = extracted {
            error!("Extractor {} failed: {e:#}", extractor.name());
            abort_all(&outputs);
            return ExtractorOutcome::Failed { theme: None, error: e };
        }

        for (closed, theme) in outputs.iter().enumerate() {
            if let Err(e) = theme.close() {
                error!("Extractor {} cannot close {theme}: {e}", extractor.name());
                withdraw_all(&outputs[..closed]);
                abort_all(&outputs[closed + 1..]);
                return ExtractorOutcome::Failed {
                    theme: Some(theme.name().to_string()),
                    error: e.into(),
                };
            }
        }
        debug!("Extractor {} done", extractor.name());
        ExtractorOutcome::Succeeded
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

/// Unbind closed outputs and delete their files.
fn withdraw_all(themes: &[Arc<Theme>]) {
    for theme in themes {
        let file = theme.file();
        if let Err(e) = theme.unbind() {
            warn!("Could not unbind {theme}: {e}");
        }
        if let Some(file) = file {
            if let Err(e) = std::fs::remove_file(&file) {
                warn!("Could not remove {}: {e}", file.display());
            }
        }
    }
}

fn abort_all(themes: &[Arc<Theme>]) {
    for theme in themes {
        if let Err(e) = theme.abort() {
            warn!("Could not abort {theme}: {e}");
        }
    }
}
