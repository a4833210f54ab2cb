//! Branch coverage aggregation.
//!
//! This module reduces trace matrices to per-branch coverage and drives
//! the batch over all configured functions.

use crate::error::CoverageError;
use crate::models::{FunctionCoverage, RunSummary, SkippedFunction};
use crate::report::ReportSink;
use crate::trace::TraceMatrix;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Sum each column across all runs.
pub fn column_totals(matrix: &TraceMatrix) -> Vec<u64> {
    matrix
        .rows()
        .fold(vec![0u64; matrix.branch_count()], |mut totals, row| {
            for (total, &value) in totals.iter_mut().zip(row) {
                *total = total.saturating_add(value);
            }
            totals
        })
}

/// A branch is covered iff its column total is greater than zero.
pub fn branch_coverage(matrix: &TraceMatrix) -> Vec<bool> {
    column_totals(matrix).into_iter().map(|total| total > 0).collect()
}

/// Compute the coverage summary for one function's trace matrix.
pub fn summarize(
    function_id: u32,
    matrix: &TraceMatrix,
    path: &Path,
) -> Result<FunctionCoverage, CoverageError> {
    FunctionCoverage::new(function_id, branch_coverage(matrix)).ok_or_else(|| {
        CoverageError::MalformedInput {
            path: path.to_path_buf(),
            reason: "no branches recorded".to_string(),
        }
    })
}

/// Load and summarize the trace file for one function.
pub fn process_function(function_id: u32, path: &Path) -> Result<FunctionCoverage, CoverageError> {
    let matrix = TraceMatrix::load(path)?;
    summarize(function_id, &matrix, path)
}

/// Process every function in order, writing one block per result to `sink`.
///
/// Missing or malformed trace files are logged and skipped. Only a sink
/// failure stops the batch.
pub fn process_all<F, S>(
    function_ids: &[u32],
    filename_for: F,
    sink: &mut S,
) -> Result<RunSummary, CoverageError>
where
    F: Fn(u32) -> PathBuf,
    S: ReportSink + ?Sized,
{
    let mut run = RunSummary::default();

    for &function_id in function_ids {
        let path = filename_for(function_id);

        match process_function(function_id, &path) {
            Ok(summary) => {
                debug!(
                    "Function #{}: {}/{} branches covered ({}%)",
                    function_id,
                    summary.branches_covered,
                    summary.branch_count,
                    summary.coverage_percentage
                );
                sink.function_block(&summary)?;
                run.functions.push(summary);
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping function #{}: {}", function_id, e);
                let skipped = SkippedFunction {
                    function_id,
                    path: path.display().to_string(),
                    reason: e.reason(),
                };
                sink.skipped_block(&skipped)?;
                run.skipped.push(skipped);
            }
            Err(e) => return Err(e),
        }
    }

    sink.finish(&run)?;
    Ok(run)
}
