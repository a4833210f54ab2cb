//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap. Every flag is
//! optional; unset flags fall back to the config file, then to defaults.

use crate::config::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

/// branchcov - branch coverage from recorded test traces
///
/// Reads one CSV trace file per function (rows are test runs, columns are
/// branches) and writes per-function branch coverage to a report.
///
/// Examples:
///   branchcov
///   branchcov --input-dir traces --function-count 25
///   branchcov --output-file coverage.txt --mark-skipped
///   branchcov --format json --output-file coverage.json
///   branchcov --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing test_NN.csv trace files
    ///
    /// Defaults to the current directory.
    #[arg(short, long, value_name = "DIR", env = "BRANCHCOV_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Report file path
    ///
    /// Defaults to result.txt in the current directory.
    #[arg(short, long, value_name = "FILE", env = "BRANCHCOV_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Number of functions to process (ids 1..=COUNT)
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub function_count: Option<u32>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .branchcov.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Append to the report instead of rewriting it
    #[arg(long)]
    pub append: bool,

    /// Write a SKIPPED block for functions whose trace file is missing or malformed
    #[arg(long)]
    pub mark_skipped: bool,

    /// Exit with code 2 if any function's coverage is below this percentage
    #[arg(long, value_name = "PCT")]
    pub fail_under: Option<f64>,

    /// Show which trace files would be read and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (warnings and errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .branchcov.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.function_count == Some(0) {
            return Err("Function count must be at least 1".to_string());
        }

        if let Some(threshold) = self.fail_under {
            if !(0.0..=100.0).contains(&threshold) {
                return Err("--fail-under must be between 0 and 100".to_string());
            }
        }

        if let Some(ref dir) = self.input_dir {
            if !dir.exists() {
                return Err(format!("Input directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Input path is not a directory: {}", dir.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::WARN
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input_dir: None,
            output_file: None,
            function_count: None,
            config: None,
            format: None,
            append: false,
            mark_skipped: false,
            fail_under: None,
            dry_run: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_no_arguments_is_valid() {
        let args = Args::try_parse_from(["branchcov"]).unwrap();
        assert!(args.validate().is_ok());
        assert!(args.function_count.is_none());
        assert!(!args.append);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "branchcov",
            "--output-file",
            "out.json",
            "-n",
            "4",
            "--format",
            "json",
            "--mark-skipped",
        ])
        .unwrap();
        assert_eq!(args.output_file, Some(PathBuf::from("out.json")));
        assert_eq!(args.function_count, Some(4));
        assert_eq!(args.format, Some(ReportFormat::Json));
        assert!(args.mark_skipped);
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_values() {
        let mut args = make_args();
        args.function_count = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.fail_under = Some(120.0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.input_dir = Some(PathBuf::from("/definitely/not/a/real/dir"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::WARN);
    }
}
