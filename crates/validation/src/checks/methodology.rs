//! Methodology: is the study described well enough to be reproduced.

use super::percent;
use crate::context::ValidationContext;
use crate::types::{QualityCategory, Severity, ValidationIssue};

const CATEGORY: QualityCategory = QualityCategory::Methodology;

fn is_blank(value: Option<&String>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

pub fn check(ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
    let methodology = &ctx.config.methodology;
    let mut issues = Vec::new();

    if is_blank(methodology.classification_prompt.as_ref()) {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Medium,
            "Classification prompt not recorded",
            "Record the exact prompt or model used to label sentiment",
        ));
    }

    if is_blank(methodology.collection_method.as_ref()) {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Medium,
            "Event collection method not recorded",
            "Describe how events were collected and any filtering applied",
        ));
    }

    if is_blank(methodology.data_source.as_ref()) {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Low,
            "Market data source not recorded",
            "Name the price data vendor and bar interval",
        ));
    }

    if !ctx.labels.is_empty() {
        let fallback = ctx.labels.iter().filter(|l| l.is_fallback()).count();
        let share = fallback as f64 / ctx.labels.len() as f64;
        if share > ctx.quality().fallback_share {
            issues.push(ValidationIssue::new(
                CATEGORY,
                Severity::Low,
                format!("{} of labels come from the keyword fallback", percent(share)),
                "Re-run classification when the sentiment source is available",
            ));
        }
    }

    issues
}
