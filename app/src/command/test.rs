use std::path::PathBuf;

use kbforge_config::Config;
use kbforge_extractors::{CaseFailure, CaseStatus, ExtractorRegistry, TestHarness};
use tracing::info;

/// Strategy for running every extractor test case against its gold standard.
///
/// Prints `<passed>/<total> tests succeeded` and fails if any case failed.
#[derive(Debug, Clone, Copy)]
pub struct TestStrategy;

impl super::CommandStrategy for TestStrategy {
    /// Settings file; the conventional location when `None`.
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.as_deref())?;
        let output_folder = config.require_test_output_folder()?.to_path_buf();
        info!("Test output goes to {}", output_folder.display());

        let report = tokio::task::spawn_blocking(move || {
            let extractors = ExtractorRegistry::with_builtin();
            TestHarness::new(&extractors, &config.test_cases_folder, output_folder)
                .with_header(&config.header)
                .with_fast_load(config.fast_load)
                .run_all()
        })
        .await??;

        for case in &report.cases {
            if let CaseStatus::Failed(failure) = &case.status {
                println!("FAILED {}: {failure}", case.name);
                if let CaseFailure::Mismatch(mismatches) = failure {
                    for mismatch in mismatches {
                        for fact in &mismatch.diff.missing {
                            println!("  {} missing: {fact}", mismatch.theme);
                        }
                        for fact in &mismatch.diff.extra {
                            println!("  {} extra: {fact}", mismatch.theme);
                        }
                    }
                }
            }
        }
        println!("{}", report.summary());

        if report.failed() > 0 {
            anyhow::bail!("{} of {} test cases failed", report.failed(), report.total());
        }
        Ok(())
    }
}
