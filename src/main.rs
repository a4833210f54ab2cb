//! branchcov - branch coverage from recorded test traces
//!
//! Reads one CSV trace matrix per function, marks each branch covered if
//! any run exercised it, and writes per-function coverage blocks to a report.
//!
//! Exit codes:
//!   0 - Success (skipped functions do not change this)
//!   1 - Runtime error (report unwritable, invalid config, etc.)
//!   2 - A function's coverage is below --fail-under

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod trace;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, ReportFormat};
use models::RunSummary;
use report::{JsonSink, ReportSink, TextSink};
use std::io::BufWriter;
use std::path::PathBuf;
use trace::TraceLocator;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("branchcov v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the coverage batch
    match run(&args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Coverage run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .branchcov.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .branchcov.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .branchcov.toml")?;

    println!("✅ Created .branchcov.toml with default settings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the coverage batch. Returns exit code (0 or 2).
fn run(args: &Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;

    // Handle --dry-run: resolve trace files and exit
    if args.dry_run {
        return handle_dry_run(&config);
    }

    let run = run_coverage(&config)?;
    print_summary(&run, &config);

    // Check --fail-under threshold
    if let Some(threshold) = args.fail_under {
        let below = run.below_threshold(threshold);
        if !below.is_empty() {
            for f in &below {
                eprintln!(
                    "⛔ Function #{} coverage {}% is below {}%",
                    f.function_id,
                    report::format_percentage(f.coverage_percentage),
                    threshold
                );
            }
            return Ok(2);
        }
    }

    Ok(0)
}

/// Process every configured function and write the report.
fn run_coverage(config: &Config) -> Result<RunSummary> {
    let locator = TraceLocator::from(&config.input);
    let function_ids = config.input.function_ids();
    let output = &config.report.output;

    info!(
        "Processing {} functions from {}",
        function_ids.len(),
        locator.dir.display()
    );

    let file = report::open_report(output, config.report.effective_mode())
        .with_context(|| format!("Failed to open report {}", output.display()))?;
    let writer = BufWriter::new(file);

    // Text streams blocks as it goes; JSON writes once at the end
    let mut sink: Box<dyn ReportSink> = match config.report.format {
        ReportFormat::Text => Box::new(TextSink::new(writer, config.report.mark_skipped)),
        ReportFormat::Json => Box::new(JsonSink::new(writer)),
    };

    analysis::process_all(&function_ids, |id| locator.path_for(id), sink.as_mut())
        .with_context(|| format!("Failed to write report to {}", output.display()))
}

/// Print the end-of-run summary to stdout.
fn print_summary(run: &RunSummary, config: &Config) {
    println!("\n📊 Coverage Summary:");
    println!("   Functions processed: {}", run.functions.len());
    println!("   Functions skipped: {}", run.skipped.len());

    for f in &run.functions {
        if f.is_fully_covered() {
            debug!("Function #{} fully covered", f.function_id);
        } else {
            debug!(
                "Function #{} uncovered branches: {:?}",
                f.function_id,
                f.uncovered_branches()
            );
        }
    }

    match run.overall_percentage() {
        Some(pct) => println!(
            "   Branches covered: {}/{} ({}%)",
            run.total_covered(),
            run.total_branches(),
            report::format_percentage(pct)
        ),
        None => warn!("No trace files could be processed"),
    }

    println!(
        "\n✅ Report saved to: {}",
        config.report.output.display()
    );
}

/// Resolve every configured function to its trace file and whether it exists.
fn resolve_trace_files(config: &Config) -> Vec<(u32, PathBuf, bool)> {
    let locator = TraceLocator::from(&config.input);
    config
        .input
        .function_ids()
        .into_iter()
        .map(|id| {
            let path = locator.path_for(id);
            let found = path.is_file();
            (id, path, found)
        })
        .collect()
}

/// Handle --dry-run: resolve trace files, print what would be read, exit.
fn handle_dry_run(config: &Config) -> Result<i32> {
    println!("\n🔍 Dry run: resolving trace files (nothing is written)...\n");

    for (id, path, found) in resolve_trace_files(config) {
        let status = if found { "found" } else { "missing" };
        println!("     📄 #{} {} ({})", id, path.display(), status);
    }

    println!("\n   Report would be written to: {}", config.report.output.display());
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportMode;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> Config {
        let mut config = Config::default();
        config.input.dir = dir.to_path_buf();
        config.report.output = dir.join("result.txt");
        config
    }

    fn write_traces(dir: &Path) {
        fs::write(dir.join("test_01.csv"), "1,0,0\n0,0,0\n1,1,0\n").unwrap();
        fs::write(dir.join("test_02.csv"), "0,0,0\n").unwrap();
        fs::write(dir.join("test_04.csv"), "3,1\n").unwrap();
    }

    #[test]
    fn test_run_writes_expected_report() {
        let temp_dir = TempDir::new().unwrap();
        write_traces(temp_dir.path());
        let config = config_for(temp_dir.path());

        let run = run_coverage(&config).unwrap();
        assert_eq!(run.functions.len(), 3);
        assert_eq!(run.skipped.len(), 7);

        let report = fs::read_to_string(&config.report.output).unwrap();
        let sep = report::SEPARATOR;
        let expected = format!(
            "{sep}\nFunction ID: #1\nBranches: 3\nBranches covered: 2\nBranch coverage: 66.67%\n\
             Branch 1: ✅\nBranch 2: ✅\nBranch 3: ❌\n\n\
             {sep}\nFunction ID: #2\nBranches: 3\nBranches covered: 0\nBranch coverage: 0.0%\n\
             Branch 1: ❌\nBranch 2: ❌\nBranch 3: ❌\n\n\
             {sep}\nFunction ID: #4\nBranches: 2\nBranches covered: 2\nBranch coverage: 100.0%\n\
             Branch 1: ✅\nBranch 2: ✅\n\n"
        );
        assert_eq!(report, expected);
    }

    #[test]
    fn test_dry_run_resolution() {
        let temp_dir = TempDir::new().unwrap();
        write_traces(temp_dir.path());
        let mut config = config_for(temp_dir.path());
        config.input.function_count = 4;

        let resolved = resolve_trace_files(&config);
        let found: Vec<(u32, bool)> = resolved.iter().map(|(id, _, f)| (*id, *f)).collect();
        assert_eq!(found, vec![(1, true), (2, true), (3, false), (4, true)]);
        assert_eq!(resolved[2].1, temp_dir.path().join("test_03.csv"));

        assert_eq!(handle_dry_run(&config).unwrap(), 0);
        assert!(!config.report.output.exists());
    }

    #[test]
    fn test_truncate_mode_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        write_traces(temp_dir.path());
        let config = config_for(temp_dir.path());

        run_coverage(&config).unwrap();
        let first = fs::read(&config.report.output).unwrap();
        run_coverage(&config).unwrap();
        let second = fs::read(&config.report.output).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_append_mode_accumulates_runs() {
        let temp_dir = TempDir::new().unwrap();
        write_traces(temp_dir.path());
        let mut config = config_for(temp_dir.path());
        config.report.mode = ReportMode::Append;

        run_coverage(&config).unwrap();
        run_coverage(&config).unwrap();

        let report = fs::read_to_string(&config.report.output).unwrap();
        assert_eq!(report.matches("Function ID: #1\n").count(), 2);
    }

    #[test]
    fn test_json_report() {
        let temp_dir = TempDir::new().unwrap();
        write_traces(temp_dir.path());
        let mut config = config_for(temp_dir.path());
        config.report.format = ReportFormat::Json;

        run_coverage(&config).unwrap();

        let json = fs::read_to_string(&config.report.output).unwrap();
        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.functions.len(), 3);
        assert_eq!(parsed.skipped.len(), 7);
        assert_eq!(parsed.functions[0].coverage_percentage, 66.67);
    }

    #[test]
    fn test_unwritable_report_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        write_traces(temp_dir.path());
        let mut config = config_for(temp_dir.path());
        config.report.output = temp_dir.path().join("missing-dir").join("result.txt");

        assert!(run_coverage(&config).is_err());
    }
}
