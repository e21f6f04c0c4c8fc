//! Configuration management for the grounding CLI.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.grounded/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Only pipeline limits and output preferences are configurable. The
//! confidence weights and preview lengths are fixed engine constants.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default cap on evidence chunks accepted per request.
pub const DEFAULT_MAX_CHUNKS: usize = 20;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .grounded/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Pipeline settings
    pub explain: ExplainSettings,
}

/// Settings for the explain pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainSettings {
    /// Maximum number of evidence chunks a request may carry
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// Run the fallback entity extractor when a request has no entities
    #[serde(default)]
    pub extract_entities: bool,

    /// Pretty-print JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_max_chunks() -> usize {
    DEFAULT_MAX_CHUNKS
}

fn default_pretty() -> bool {
    true
}

impl Default for ExplainSettings {
    fn default() -> Self {
        Self {
            max_chunks: default_max_chunks(),
            extract_entities: false,
            pretty: default_pretty(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    explain: Option<ExplainFileSection>,
    logging: Option<LoggingConfig>,
}

/// Explain settings as written in a config file; absent keys keep the
/// value from the earlier layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplainFileSection {
    max_chunks: Option<usize>,
    extract_entities: Option<bool>,
    pretty: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            explain: ExplainSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// `workspace` and `config_file` beat their environment variables and
    /// decide which YAML file is read, so they must be known before layering.
    ///
    /// Environment variables:
    /// - `GROUNDED_WORKSPACE`: Override workspace path
    /// - `GROUNDED_CONFIG`: Path to config file
    /// - `GROUNDED_MAX_CHUNKS`: Evidence chunk cap
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env("GROUNDED_WORKSPACE").map(PathBuf::from)) {
            config.workspace = workspace;
        }
        config.config_file = config_file.or_else(|| env("GROUNDED_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.grounded_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        config.apply_env(env)?;
        Ok(config)
    }

    /// Apply environment overrides on top of the file layer.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(max_chunks) = lookup("GROUNDED_MAX_CHUNKS") {
            self.explain.max_chunks = max_chunks.parse().map_err(|e| {
                AppError::Config(format!("Invalid GROUNDED_MAX_CHUNKS {:?}: {}", max_chunks, e))
            })?;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(explain) = config_file.explain {
            if let Some(max_chunks) = explain.max_chunks {
                result.explain.max_chunks = max_chunks;
            }
            if let Some(extract_entities) = explain.extract_entities {
                result.explain.extract_entities = extract_entities;
            }
            if let Some(pretty) = explain.pretty {
                result.explain.pretty = pretty;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the YAML file.
    /// Workspace and config file paths go through [`AppConfig::load_with`].
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .grounded directory.
    pub fn grounded_dir(&self) -> PathBuf {
        self.workspace.join(".grounded")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        if self.explain.max_chunks == 0 {
            return Err(AppError::Config(
                "explain.maxChunks must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
