#![deny(
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
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;

use command::{
    CommandStrategy, InitStrategy, RunInput, RunStrategy, TestStrategy, ThemesStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "kbforge")]
#[command(about = "Builds a knowledge base from extractors writing named fact sets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extractor test cases and compare with their gold standards
    Test {
        /// Settings file (defaults to kbforge.json)
        init_file: Option<PathBuf>,
    },
    /// Run extractors as one pipeline
    Run {
        /// Settings file (defaults to kbforge.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Extractors to run; all registered extractors if none given
        extractors: Vec<String>,
    },
    /// List the themes the registered extractors declare
    Themes,
    /// Create a settings template
    Init {
        /// Where to write it (defaults to kbforge.json)
        path: Option<PathBuf>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Test { init_file } => TestStrategy.execute(init_file).await,
        Commands::Run { config, extractors } => {
            RunStrategy.execute(RunInput { config, extractors }).await
        }
        Commands::Themes => ThemesStrategy.execute(()).await,
        Commands::Init { path } => InitStrategy.execute(path).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
