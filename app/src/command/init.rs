use std::path::PathBuf;

use kbforge_config::Config;

/// Strategy for writing a settings template, `kbforge.json` unless a path
/// is given. An existing file is left alone.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        Config::create_config(input.as_deref())?;
        Ok(())
    }
}
