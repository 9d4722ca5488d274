//! Statistical validity: is there enough usable data for each kind of claim.

use std::collections::BTreeMap;

use super::percent;
use crate::context::ValidationContext;
use crate::types::{QualityCategory, Severity, ValidationIssue};

const CATEGORY: QualityCategory = QualityCategory::StatisticalValidity;

pub fn check(ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
    let quality = ctx.quality();
    let mut issues = Vec::new();
    let usable = ctx.usable_events();

    for (analysis, minimum) in quality.min_samples.entries() {
        if usable < minimum {
            issues.push(ValidationIssue::new(
                CATEGORY,
                Severity::High,
                format!(
                    "{} usable events; {} requires at least {}",
                    usable, analysis, minimum
                ),
                format!(
                    "Collect at least {} more events or treat {} results as exploratory",
                    minimum - usable,
                    analysis
                ),
            ));
        }
    }

    if !ctx.labels.is_empty() {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in ctx.labels {
            *counts.entry(label.category.as_str()).or_default() += 1;
        }
        if let Some((category, count)) = counts.iter().max_by_key(|(_, n)| **n) {
            let share = *count as f64 / ctx.labels.len() as f64;
            if share > quality.dominant_sentiment_share {
                issues.push(ValidationIssue::new(
                    CATEGORY,
                    Severity::Medium,
                    format!("{} of labels are {}; little sentiment contrast", percent(share), category),
                    "Sentiment comparisons need events from more than one category",
                ));
            }
        }
    }

    issues
}
