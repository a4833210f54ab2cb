//! Coverage analysis.
//!
//! Reduces per-function trace matrices to branch coverage summaries.

pub mod aggregator;

pub use aggregator::*;
