//! Coverage report generation.
//!
//! This module formats per-function summary blocks and writes them to
//! the report file, either as plain text or as a single JSON document.

use crate::config::ReportMode;
use crate::models::{FunctionCoverage, RunSummary, SkippedFunction};
use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Line that opens every summary block.
pub const SEPARATOR: &str = "–––––––––––––––––––––––––";

/// Marker for an exercised branch.
pub const COVERED_MARK: &str = "✅";

/// Marker for a branch no run exercised.
pub const NOT_COVERED_MARK: &str = "❌";

/// Receives report blocks as functions are processed.
pub trait ReportSink {
    /// Called once per successfully processed function.
    fn function_block(&mut self, summary: &FunctionCoverage) -> io::Result<()>;

    /// Called once per skipped function.
    fn skipped_block(&mut self, skipped: &SkippedFunction) -> io::Result<()>;

    /// Called after the last function.
    fn finish(&mut self, run: &RunSummary) -> io::Result<()>;
}

/// Writes text blocks as soon as each function is done.
pub struct TextSink<W: Write> {
    writer: W,
    mark_skipped: bool,
}

impl<W: Write> TextSink<W> {
    /// Create a text sink. With `mark_skipped`, skipped functions get a marker block.
    pub fn new(writer: W, mark_skipped: bool) -> Self {
        Self {
            writer,
            mark_skipped,
        }
    }

    /// Recover the underlying writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn function_block(&mut self, summary: &FunctionCoverage) -> io::Result<()> {
        self.writer
            .write_all(generate_function_block(summary).as_bytes())
    }

    fn skipped_block(&mut self, skipped: &SkippedFunction) -> io::Result<()> {
        if !self.mark_skipped {
            return Ok(());
        }
        self.writer
            .write_all(generate_skipped_block(skipped).as_bytes())
    }

    fn finish(&mut self, _run: &RunSummary) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Writes the whole run as JSON once processing is complete.
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn function_block(&mut self, _summary: &FunctionCoverage) -> io::Result<()> {
        Ok(())
    }

    fn skipped_block(&mut self, _skipped: &SkippedFunction) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, run: &RunSummary) -> io::Result<()> {
        let json = generate_json_report(run).map_err(io::Error::other)?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Format a rounded percentage, keeping at least one decimal digit.
///
/// `66.67` stays `66.67`, `100` becomes `100.0`, `12.5` stays `12.5`.
pub fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Generate the summary block for one function.
pub fn generate_function_block(summary: &FunctionCoverage) -> String {
    let mut block = String::new();

    block.push_str(SEPARATOR);
    block.push('\n');
    block.push_str(&format!("Function ID: #{}\n", summary.function_id));
    block.push_str(&format!("Branches: {}\n", summary.branch_count));
    block.push_str(&format!("Branches covered: {}\n", summary.branches_covered));
    block.push_str(&format!(
        "Branch coverage: {}%\n",
        format_percentage(summary.coverage_percentage)
    ));

    for (i, &covered) in summary.branches.iter().enumerate() {
        let mark = if covered {
            COVERED_MARK
        } else {
            NOT_COVERED_MARK
        };
        block.push_str(&format!("Branch {}: {}\n", i + 1, mark));
    }

    block.push('\n');
    block
}

/// Generate the marker block for a skipped function.
pub fn generate_skipped_block(skipped: &SkippedFunction) -> String {
    format!(
        "{}\nFunction ID: #{}\nSKIPPED: {} ({})\n\n",
        SEPARATOR, skipped.function_id, skipped.reason, skipped.path
    )
}

/// Generate a JSON report.
pub fn generate_json_report(run: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(run).map_err(Into::into)
}

/// Open the report file, truncating or appending per `mode`.
pub fn open_report(path: &Path, mode: ReportMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        ReportMode::Truncate => options.write(true).truncate(true),
        ReportMode::Append => options.append(true),
    };
    options.open(path)
}
