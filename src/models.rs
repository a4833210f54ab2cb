//! Data models for coverage results.
//!
//! This module contains the per-function coverage summary and the
//! run-level results produced by the aggregator.

use serde::{Deserialize, Serialize};

/// Coverage summary for a single function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCoverage {
    /// Function identifier.
    pub function_id: u32,
    /// Number of branches (trace matrix columns).
    pub branch_count: usize,
    /// Number of branches exercised by at least one run.
    pub branches_covered: usize,
    /// Covered share in percent, rounded to 2 decimals.
    pub coverage_percentage: f64,
    /// One entry per branch, true if covered.
    pub branches: Vec<bool>,
}

impl FunctionCoverage {
    /// Build a summary from a branch coverage vector.
    ///
    /// Returns `None` for an empty vector since the percentage is undefined.
    pub fn new(function_id: u32, branches: Vec<bool>) -> Option<Self> {
        if branches.is_empty() {
            return None;
        }

        let branch_count = branches.len();
        let branches_covered = branches.iter().filter(|&&covered| covered).count();

        Some(Self {
            function_id,
            branch_count,
            branches_covered,
            coverage_percentage: coverage_percentage(branches_covered, branch_count),
            branches,
        })
    }

    /// Whether every branch was exercised.
    pub fn is_fully_covered(&self) -> bool {
        self.branches_covered == self.branch_count
    }

    /// 1-based indices of branches never exercised.
    pub fn uncovered_branches(&self) -> Vec<usize> {
        self.branches
            .iter()
            .enumerate()
            .filter(|&(_, &covered)| !covered)
            .map(|(i, _)| i + 1)
            .collect()
    }
}

/// `round(100 * covered / total, 2)`; `total` must be non-zero.
///
/// Rounds the exact binary value, with ties going to the even digit.
pub fn coverage_percentage(covered: usize, total: usize) -> f64 {
    let raw = 100.0 * covered as f64 / total as f64;
    format!("{:.2}", raw).parse().unwrap_or(raw)
}

/// A function that was attempted but produced no summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFunction {
    /// Function identifier.
    pub function_id: u32,
    /// Trace file that was looked up.
    pub path: String,
    /// Why the function was skipped.
    pub reason: String,
}

/// Results of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Successfully processed functions, in processing order.
    pub functions: Vec<FunctionCoverage>,
    /// Skipped functions, in processing order.
    pub skipped: Vec<SkippedFunction>,
}

impl RunSummary {
    /// Total branches across processed functions.
    pub fn total_branches(&self) -> usize {
        self.functions.iter().map(|f| f.branch_count).sum()
    }

    /// Total covered branches across processed functions.
    pub fn total_covered(&self) -> usize {
        self.functions.iter().map(|f| f.branches_covered).sum()
    }

    /// Overall percentage across processed functions, if any branches exist.
    pub fn overall_percentage(&self) -> Option<f64> {
        match self.total_branches() {
            0 => None,
            total => Some(coverage_percentage(self.total_covered(), total)),
        }
    }

    /// Processed functions whose coverage falls below `threshold`.
    pub fn below_threshold(&self, threshold: f64) -> Vec<&FunctionCoverage> {
        self.functions
            .iter()
            .filter(|f| f.coverage_percentage < threshold)
            .collect()
    }
}
