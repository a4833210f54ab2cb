//! Trace file discovery and loading.
//!
//! A trace file holds one row per test run and one column per branch,
//! as comma-separated non-negative integers without a header.

use crate::error::CoverageError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps function identifiers to trace file paths.
#[derive(Debug, Clone)]
pub struct TraceLocator {
    /// Directory containing the trace files
    pub dir: PathBuf,
    /// File name prefix (e.g., "test_")
    pub prefix: String,
    /// File extension without the dot
    pub extension: String,
    /// Zero-padded width of the identifier
    pub id_width: usize,
}

impl Default for TraceLocator {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            prefix: "test_".to_string(),
            extension: "csv".to_string(),
            id_width: 2,
        }
    }
}

impl From<&crate::config::InputConfig> for TraceLocator {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            prefix: config.prefix.clone(),
            extension: config.extension.clone(),
            id_width: config.id_width,
        }
    }
}

impl TraceLocator {
    /// File name for a function, e.g. `test_01.csv` for id 1.
    pub fn file_name(&self, function_id: u32) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            function_id,
            self.extension,
            width = self.id_width
        )
    }

    /// Full path of the trace file for a function.
    pub fn path_for(&self, function_id: u32) -> PathBuf {
        self.dir.join(self.file_name(function_id))
    }
}

/// Run × branch execution table for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceMatrix {
    rows: Vec<Vec<u64>>,
    columns: usize,
}

impl TraceMatrix {
    /// Build a matrix from rows, rejecting empty or ragged input.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self, String> {
        let columns = match rows.first() {
            Some(first) => first.len(),
            None => return Err("no runs recorded".to_string()),
        };
        if columns == 0 {
            return Err("no branches recorded".to_string());
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(format!(
                    "row {} has {} columns, expected {}",
                    i + 1,
                    row.len(),
                    columns
                ));
            }
        }

        Ok(Self { rows, columns })
    }

    /// Parse comma-separated trace text.
    ///
    /// Blank lines and whitespace around cells are ignored.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut rows = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let row = line
                .split(',')
                .enumerate()
                .map(|(col, cell)| parse_cell(cell.trim(), line_no + 1, col + 1))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        Self::from_rows(rows)
    }

    /// Read and parse a trace file.
    pub fn load(path: &Path) -> Result<Self, CoverageError> {
        let bytes = fs::read(path).map_err(|source| CoverageError::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|e| CoverageError::MalformedInput {
            path: path.to_path_buf(),
            reason: format!("not valid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        })?;

        let matrix = Self::parse(&content).map_err(|reason| CoverageError::MalformedInput {
            path: path.to_path_buf(),
            reason,
        })?;

        debug!(
            "Loaded {}: {} runs x {} branches",
            path.display(),
            matrix.run_count(),
            matrix.branch_count()
        );
        Ok(matrix)
    }

    /// Number of runs (rows).
    pub fn run_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of branches (columns).
    pub fn branch_count(&self) -> usize {
        self.columns
    }

    /// Iterate over runs.
    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

fn parse_cell(cell: &str, line: usize, column: usize) -> Result<u64, String> {
    if cell.is_empty() {
        return Err(format!("empty cell at line {}, column {}", line, column));
    }
    match cell.parse::<u64>() {
        Ok(v) => Ok(v),
        Err(_) if is_negative_integer(cell) => Err(format!(
            "negative value {} at line {}, column {}",
            cell, line, column
        )),
        Err(_) => Err(format!(
            "non-numeric value '{}' at line {}, column {}",
            cell, line, column
        )),
    }
}

fn is_negative_integer(cell: &str) -> bool {
    cell.strip_prefix('-')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
