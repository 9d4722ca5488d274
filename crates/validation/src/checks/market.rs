//! Market integration: did events actually meet price data.

use super::percent;
use crate::context::ValidationContext;
use crate::types::{QualityCategory, Severity, ValidationIssue};

const CATEGORY: QualityCategory = QualityCategory::MarketIntegration;

pub fn check(ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
    let quality = ctx.quality();
    let mut issues = Vec::new();

    for (symbol, records) in ctx.records_by_symbol() {
        if !records.iter().any(|r| r.has_baseline()) {
            issues.push(ValidationIssue::new(
                CATEGORY,
                Severity::Critical,
                format!("No price data aligned for {}", symbol),
                format!("Fetch OHLCV bars for {} covering the event window", symbol),
            ));
        }
    }

    let total = ctx.records.len();
    let resolved_fraction = if total == 0 {
        0.0
    } else {
        ctx.resolved_baselines() as f64 / total as f64
    };

    let baseline_message = format!(
        "Baseline price resolved for {} of impact records ({}/{})",
        percent(resolved_fraction),
        ctx.resolved_baselines(),
        total
    );
    if resolved_fraction < quality.min_resolved_fraction {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Critical,
            baseline_message,
            "Check bar granularity against the matching tolerance",
        ));
    } else if resolved_fraction < quality.warn_resolved_fraction {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::High,
            baseline_message,
            "Check bar granularity against the matching tolerance",
        ));
    }

    if !ctx.records.iter().any(|r| r.any_resolved()) {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Critical,
            "No price change computed at any horizon",
            "Impact figures cannot be reported without aligned prices",
        ));
    }

    issues
}
