//! `useref transform` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use useref_config::CliSettings;
use useref_core::Transformed;

use super::{manifest_json, report_unterminated, run_transform, write_stdout};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the transform command.
#[derive(Args)]
pub(crate) struct TransformArgs {
    /// Document to rewrite.
    input: PathBuf,

    /// Write the rewritten document here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the asset manifest as JSON to this file.
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Replace blocks with their own content (overrides config).
    #[arg(long)]
    noconcat: bool,

    /// Path to configuration file (default: auto-discover useref.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl TransformArgs {
    /// Execute the transform command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read, or
    /// an output file cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            noconcat: self.noconcat.then_some(true),
        };
        let transformed = run_transform(&self.input, self.config.as_deref(), &cli_settings)?;
        report_unterminated(&output, &self.input, &transformed.unterminated);

        write_results(
            &transformed,
            self.output.as_deref(),
            self.manifest.as_deref(),
        )?;

        if let Some(path) = &self.output {
            output.success(&format!("Wrote {}", path.display()));
        }
        if let Some(path) = &self.manifest {
            output.success(&format!("Wrote manifest to {}", path.display()));
        }
        Ok(())
    }
}

/// Write the rewritten document and, if requested, the manifest.
fn write_results(
    transformed: &Transformed,
    output: Option<&Path>,
    manifest: Option<&Path>,
) -> Result<(), CliError> {
    match output {
        Some(path) => std::fs::write(path, &transformed.content)?,
        None => write_stdout(&transformed.content)?,
    }
    if let Some(path) = manifest {
        std::fs::write(path, manifest_json(&transformed.manifest)?)?;
    }
    Ok(())
}
