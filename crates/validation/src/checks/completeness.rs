//! Completeness: how much of the impact grid actually resolved.

use super::percent;
use crate::context::ValidationContext;
use crate::types::{QualityCategory, Severity, ValidationIssue};

const CATEGORY: QualityCategory = QualityCategory::Completeness;

pub fn check(ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
    let quality = ctx.quality();
    let mut issues = Vec::new();

    let total = ctx.records.len();
    let all_missing = ctx.records.iter().filter(|r| r.all_missing()).count();
    let missing_fraction = if total == 0 {
        1.0
    } else {
        all_missing as f64 / total as f64
    };

    if missing_fraction > quality.critical_missing_threshold {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Critical,
            format!(
                "{} of impact records ({}/{}) have every horizon MISSING",
                percent(missing_fraction),
                all_missing,
                total
            ),
            "Verify market data covers the event window before reporting any impact",
        ));
    } else if missing_fraction > quality.missing_issue_threshold {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::High,
            format!(
                "{} of impact records ({}/{}) have every horizon MISSING",
                percent(missing_fraction),
                all_missing,
                total
            ),
            "Backfill price data or narrow the study window to covered periods",
        ));
    } else if all_missing > 0 {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Low,
            format!(
                "{}/{} impact records unresolved ({} coverage)",
                all_missing,
                total,
                percent(1.0 - missing_fraction)
            ),
            "Note the unresolved events in the methodology section",
        ));
    }

    if !ctx.records.iter().any(|r| r.any_resolved()) {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::High,
            "No horizon value resolved; top-impact example lists are empty",
            "Do not publish best/worst examples until price data is aligned",
        ));
    }

    let with_baseline: Vec<_> = ctx.records.iter().filter(|r| r.has_baseline()).collect();
    if with_baseline.is_empty() {
        return issues;
    }

    for horizon in &ctx.config.alignment.horizons_hours {
        let missing = with_baseline
            .iter()
            .filter(|r| r.horizon(*horizon).map_or(true, |h| !h.is_resolved()))
            .count();
        let fraction = missing as f64 / with_baseline.len() as f64;
        if fraction > quality.missing_issue_threshold {
            issues.push(ValidationIssue::new(
                CATEGORY,
                Severity::Medium,
                format!(
                    "{}h horizon MISSING for {} of records with a baseline",
                    horizon,
                    percent(fraction)
                ),
                "Report effective N per horizon and consider the FORWARD_FILL policy",
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures;
    use sentiment_impact_core::{HorizonResult, ImpactRecord};

    fn run(records: &[ImpactRecord]) -> Vec<ValidationIssue> {
        let events = fixtures::events(records.len().max(1), 24);
        let config = fixtures::config();
        let ctx = ValidationContext::new(&events, &[], records, &config);
        check(&ctx)
    }

    #[test]
    fn full_coverage_has_no_issues() {
        let events = fixtures::events(20, 24);
        assert!(run(&fixtures::records(&events, "TSLA", 0)).is_empty());
    }

    #[test]
    fn small_gap_is_low_not_critical() {
        // 148 of 156 aligned
        let events = fixtures::events(156, 24);
        let issues = run(&fixtures::records(&events, "TSLA", 8));

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Low);
        assert!(issues[0].message.contains("94.9% coverage"), "{}", issues[0].message);
    }

    #[test]
    fn moderate_gap_is_high() {
        let events = fixtures::events(10, 24);
        let issues = run(&fixtures::records(&events, "TSLA", 2));
        assert_eq!(issues[0].severity, Severity::High);
    }

    #[test]
    fn majority_missing_is_critical() {
        let events = fixtures::events(10, 24);
        let issues = run(&fixtures::records(&events, "TSLA", 6));
        assert_eq!(issues[0].severity, Severity::Critical);
    }

    #[test]
    fn nothing_resolved_flags_empty_examples() {
        let events = fixtures::events(4, 24);
        let issues = run(&fixtures::records(&events, "TSLA", 4));

        assert!(issues.iter().any(|i| i.severity == Severity::Critical));
        assert!(issues.iter().any(|i| i.message.contains("top-impact")));
    }

    #[test]
    fn per_horizon_gap_is_medium() {
        let events = fixtures::events(10, 24);
        let mut records = fixtures::records(&events, "TSLA", 0);
        for record in records.iter_mut().take(3) {
            record.horizon_results.insert(24, HorizonResult::missing());
        }

        let issues = run(&records);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Medium);
        assert!(issues[0].message.starts_with("24h"));
    }
}
