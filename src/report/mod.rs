//! Report generation and output sinks.

pub mod generator;

pub use generator::*;
