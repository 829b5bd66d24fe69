//! Configuration management for useref.
//!
//! Parses `useref.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Example
//!
//! ```toml
//! [output]
//! noconcat = false
//!
//! [handlers.img]
//! template = '<img src="{target}" {attributes}>'
//! ```
//!
//! Each `[handlers.<type>]` section registers a template handler for blocks of
//! that type. Templates may use `{target}`, `{attributes}`, `{search_paths}` and
//! `{content}`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use useref_core::{OptionsError, TemplateHandler, TransformOptions};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override no-concatenation preview mode.
    pub noconcat: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "useref.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output configuration.
    pub output: OutputConfig,
    /// Template handlers keyed by block type.
    pub handlers: BTreeMap<String, HandlerConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Output configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Replace blocks with their own content instead of synthesized references.
    pub noconcat: bool,
}

/// Template handler for a custom block type.
#[derive(Debug, Deserialize)]
pub struct HandlerConfig {
    /// Replacement template.
    pub template: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Handler registration rejected.
    #[error("Configuration error: {0}")]
    Handler(#[from] OptionsError),
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `useref.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if parsing or
    /// validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(noconcat) = settings.noconcat {
            self.output.noconcat = noconcat;
        }
    }

    /// Build transform options from this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Handler` if a handler type or template is invalid.
    pub fn transform_options(&self) -> Result<TransformOptions, ConfigError> {
        let mut options = TransformOptions::new().with_noconcat(self.output.noconcat);
        for (kind, handler) in &self.handlers {
            let template = TemplateHandler::parse(kind, &handler.template)?;
            options = options.with_handler(kind.as_str(), template)?;
        }
        Ok(options)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::discover_from(&cwd)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that handler templates are non-empty and that every handler can
    /// be registered. Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` or `ConfigError::Handler` if any
    /// validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (kind, handler) in &self.handlers {
            if handler.template.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "handlers.{kind}.template cannot be empty"
                )));
            }
        }
        self.transform_options()?;
        Ok(())
    }
}
