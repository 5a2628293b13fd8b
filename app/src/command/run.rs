use std::path::PathBuf;

use kbforge_config::Config;
use kbforge_core::ThemeRegistry;
use kbforge_extractors::{ExtractorOutcome, ExtractorRegistry, Pipeline};
use tracing::info;

pub struct RunInput {
    pub config: Option<PathBuf>,
    /// Extractor names; empty means every registered extractor.
    pub extractors: Vec<String>,
}

/// Strategy for running extractors as one dependency-ordered pipeline,
/// reading from the configured input folder and writing to the output folder.
#[derive(Debug, Clone, Copy)]
pub struct RunStrategy;

impl super::CommandStrategy for RunStrategy {
    type Input = RunInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.config.as_deref())?;

        let report = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let registry = ExtractorRegistry::with_builtin();
            let themes = ThemeRegistry::new();
            let extractors = if input.extractors.is_empty() {
                registry.all(&themes)?
            } else {
                input
                    .extractors
                    .iter()
                    .map(|name| registry.for_name(name, None, &themes))
                    .collect::<Result<Vec<_>, _>>()?
            };

            let pipeline = Pipeline::new(extractors)?;
            info!("Execution order: {}", pipeline.order().join(", "));
            Ok(pipeline.run(&config.input_folder, &config.output_folder, &config.header)?)
        })
        .await??;

        for entry in &report.reports {
            match &entry.outcome {
                ExtractorOutcome::Succeeded => println!("ok      {}", entry.extractor),
                ExtractorOutcome::Failed { theme: Some(theme), error } => {
                    println!("FAILED  {} ({theme}): {error:#}", entry.extractor);
                }
                ExtractorOutcome::Failed { theme: None, error } => {
                    println!("FAILED  {}: {error:#}", entry.extractor);
                }
                ExtractorOutcome::Skipped { blocked_by, theme } => {
                    println!("skipped {} ({blocked_by} did not produce {theme})", entry.extractor);
                }
            }
        }

        if !report.is_success() {
            anyhow::bail!("{} extractors did not succeed", report.failed().count());
        }
        Ok(())
    }
}
