//! useref CLI - Build-block rewriter.
//!
//! Provides commands for:
//! - `transform`: Rewrite build blocks and optionally write the asset manifest
//! - `manifest`: Print the asset manifest as JSON

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ManifestArgs, TransformArgs};
use output::Output;

/// useref - Rewrite build blocks into single asset references.
#[derive(Parser)]
#[command(name = "useref", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite build blocks in a document.
    Transform(TransformArgs),
    /// Print the asset manifest of a document.
    Manifest(ManifestArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Transform(args) => args.verbose,
            Self::Manifest(args) => args.verbose,
        }
    }
}

/// Log level used when neither `--verbose` nor `RUST_LOG` is given.
const DEFAULT_LEVEL: &str = "warn";

/// Tracing directives: `--verbose` enables INFO, otherwise `RUST_LOG`, otherwise WARN.
fn filter_directives(verbose: bool, rust_log: Option<String>) -> String {
    if verbose {
        return "info".to_owned();
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_owned())
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(filter_directives(cli.command.verbose(), rust_log))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Transform(args) => args.execute(),
        Commands::Manifest(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
