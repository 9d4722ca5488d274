//! The six data-quality checks.
//!
//! Each check is a pure function of the [`ValidationContext`] and returns its
//! own issues. No check depends on another's outcome.

pub mod completeness;
pub mod consistency;
pub mod market;
pub mod methodology;
pub mod statistical;
pub mod temporal;

use crate::context::ValidationContext;
use crate::types::{QualityCategory, ValidationIssue};

pub type Check = fn(&ValidationContext<'_>) -> Vec<ValidationIssue>;

/// Checks in report order.
pub const CHECKS: [(QualityCategory, Check); 6] = [
    (QualityCategory::Completeness, completeness::check),
    (QualityCategory::Consistency, consistency::check),
    (QualityCategory::StatisticalValidity, statistical::check),
    (QualityCategory::MarketIntegration, market::check),
    (QualityCategory::TemporalCoverage, temporal::check),
    (QualityCategory::Methodology, methodology::check),
];

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}
