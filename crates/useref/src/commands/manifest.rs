//! `useref manifest` command implementation.

use std::path::PathBuf;

use clap::Args;
use useref_config::CliSettings;

use super::{manifest_json, report_unterminated, run_transform, write_stdout};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the manifest command.
#[derive(Args)]
pub(crate) struct ManifestArgs {
    /// Document to scan for build blocks.
    input: PathBuf,

    /// Path to configuration file (default: auto-discover useref.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ManifestArgs {
    /// Execute the manifest command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the input cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let transformed = run_transform(
            &self.input,
            self.config.as_deref(),
            &CliSettings::default(),
        )?;
        report_unterminated(&output, &self.input, &transformed.unterminated);

        write_stdout(&manifest_json(&transformed.manifest)?)
    }
}
