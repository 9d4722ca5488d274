//! Data-quality validation.
//!
//! [`validate`] runs six independent checks over events, labels and impact
//! records and folds their issues into a weighted [`QualityReport`].

pub mod checks;
pub mod context;
pub mod score;
pub mod types;
pub mod validator;

pub use context::ValidationContext;
pub use types::{
    QualityCategory, QualityReport, QualityStatus, QualitySummary, Severity, ValidationIssue,
};
pub use validator::{build_report, validate};
