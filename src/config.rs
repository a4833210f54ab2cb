//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.branchcov.toml` files. Every setting has a default, so running
//! without a config file processes `test_01.csv` .. `test_10.csv` in the
//! working directory and rewrites `result.txt`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".branchcov.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Trace input settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where trace files live and which functions to process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory containing the trace files.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// File name prefix before the function id.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// File extension (without dot).
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Zero-padded width of the function id in file names.
    #[serde(default = "default_id_width")]
    pub id_width: usize,

    /// Number of functions to process.
    #[serde(default = "default_function_count")]
    pub function_count: u32,

    /// Identifier of the first function.
    #[serde(default = "default_first_id")]
    pub first_id: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            prefix: default_prefix(),
            extension: default_extension(),
            id_width: default_id_width(),
            function_count: default_function_count(),
            first_id: default_first_id(),
        }
    }
}

impl InputConfig {
    /// Function identifiers in processing order.
    pub fn function_ids(&self) -> Vec<u32> {
        (0..self.function_count)
            .map(|offset| self.first_id.saturating_add(offset))
            .collect()
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_prefix() -> String {
    "test_".to_string()
}

fn default_extension() -> String {
    "csv".to_string()
}

fn default_id_width() -> usize {
    2
}

fn default_function_count() -> u32 {
    10
}

fn default_first_id() -> u32 {
    1
}

/// How the report file is opened at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Rewrite the report with this run's blocks only
    #[default]
    Truncate,
    /// Add this run's blocks after any existing content
    Append,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plain text summary blocks (default)
    #[default]
    Text,
    /// One JSON document for the whole run
    Json,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report file path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Truncate or append.
    #[serde(default)]
    pub mode: ReportMode,

    /// Text or JSON.
    #[serde(default)]
    pub format: ReportFormat,

    /// Write a SKIPPED block for functions without a usable trace file.
    #[serde(default)]
    pub mark_skipped: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            mode: ReportMode::default(),
            format: ReportFormat::default(),
            mark_skipped: false,
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("result.txt")
}

impl ReportConfig {
    /// Mode actually used when opening the report. JSON always truncates.
    pub fn effective_mode(&self) -> ReportMode {
        match self.format {
            ReportFormat::Json => ReportMode::Truncate,
            ReportFormat::Text => self.mode,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.input_dir {
            self.input.dir = dir.clone();
        }
        if let Some(count) = args.function_count {
            self.input.function_count = count;
        }

        if let Some(ref output) = args.output_file {
            self.report.output = output.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.append {
            self.report.mode = ReportMode::Append;
        }
        if args.mark_skipped {
            self.report.mark_skipped = true;
        }
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.input.function_count == 0 {
            bail!("function_count must be at least 1");
        }
        if self.input.id_width == 0 {
            bail!("id_width must be at least 1");
        }
        if self.input.extension.trim().is_empty() {
            bail!("extension must not be empty");
        }
        if self.input.first_id.checked_add(self.input.function_count - 1).is_none() {
            bail!("first_id + function_count overflows the function id range");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.dir, PathBuf::from("."));
        assert_eq!(config.input.function_ids(), (1..=10).collect::<Vec<_>>());
        assert_eq!(config.report.output, PathBuf::from("result.txt"));
        assert_eq!(config.report.mode, ReportMode::Truncate);
        assert_eq!(config.report.format, ReportFormat::Text);
        assert!(!config.report.mark_skipped);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[input]
dir = "traces"
function_count = 3
first_id = 5

[report]
output = "coverage.txt"
mode = "append"
mark_skipped = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.dir, PathBuf::from("traces"));
        assert_eq!(config.input.prefix, "test_");
        assert_eq!(config.input.function_ids(), vec![5, 6, 7]);
        assert_eq!(config.report.output, PathBuf::from("coverage.txt"));
        assert_eq!(config.report.mode, ReportMode::Append);
        assert!(config.report.mark_skipped);
    }

    #[test]
    fn test_json_always_truncates() {
        let mut report = ReportConfig {
            mode: ReportMode::Append,
            ..ReportConfig::default()
        };
        assert_eq!(report.effective_mode(), ReportMode::Append);

        report.format = ReportFormat::Json;
        assert_eq!(report.effective_mode(), ReportMode::Truncate);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.input.function_count = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.id_width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.extension = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.input.first_id = u32::MAX;
        config.input.function_count = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[input]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.input.function_count, 10);
        assert_eq!(parsed.report.mode, ReportMode::Truncate);
    }
}
