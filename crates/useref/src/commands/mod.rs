//! CLI command implementations.

pub(crate) mod manifest;
pub(crate) mod transform;

pub(crate) use manifest::ManifestArgs;
pub(crate) use transform::TransformArgs;

use std::io::Write;
use std::path::Path;

use useref_config::{CliSettings, Config};
use useref_core::{Manifest, Transformed, UnterminatedBlock};

use crate::error::CliError;
use crate::output::Output;

/// Read the input document.
fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Load configuration and transform `input`.
fn run_transform(
    input: &Path,
    config_path: Option<&Path>,
    cli_settings: &CliSettings,
) -> Result<Transformed, CliError> {
    let config = Config::load(config_path, Some(cli_settings))?;
    if let Some(path) = &config.config_path {
        tracing::info!(path = %path.display(), "Loaded configuration");
    }
    let options = config.transform_options()?;

    let content = read_input(input)?;
    let transformed = useref_core::transform(&content, &options);
    tracing::info!(
        input = %input.display(),
        entries = transformed.manifest.len(),
        "Transformed document"
    );
    Ok(transformed)
}

/// Render the manifest as pretty JSON with a trailing newline.
fn manifest_json(manifest: &Manifest) -> Result<String, CliError> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    Ok(json)
}

/// Write `content` to stdout.
fn write_stdout(content: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Warn about blocks that were left in place because they were never closed.
fn report_unterminated(output: &Output, input: &Path, blocks: &[UnterminatedBlock]) {
    for block in blocks {
        output.warning(&format!(
            "Warning: {}:{}: build:{} block has no endbuild, left unchanged",
            input.display(),
            block.line,
            block.kind
        ));
    }
}
