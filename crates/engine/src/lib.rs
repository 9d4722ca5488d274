//! End-to-end evaluation of a sentiment/price-impact study.
//!
//! [`evaluate`] aligns events with price series, scores data quality and runs
//! the statistical analysis for every symbol.

pub mod pipeline;
pub mod result;

pub use pipeline::evaluate;
pub use result::{AnalysisResult, Evaluation, SymbolResult};
