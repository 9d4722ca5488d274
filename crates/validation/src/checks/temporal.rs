//! Temporal coverage: event density and how honestly the window is described.

use crate::context::ValidationContext;
use crate::types::{QualityCategory, Severity, ValidationIssue};

const CATEGORY: QualityCategory = QualityCategory::TemporalCoverage;
const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn check(ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
    let quality = ctx.quality();
    let mut issues = Vec::new();

    let mut timestamps: Vec<_> = ctx.events.iter().map(|e| e.timestamp).collect();
    timestamps.sort_unstable();
    let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) else {
        return issues;
    };

    let span_days = (*last - *first).num_seconds() as f64 / SECONDS_PER_DAY;
    let density = timestamps.len() as f64 / span_days.max(1.0);

    if density < quality.min_events_per_day {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::High,
            format!(
                "{:.2} events/day over {:.0} days (minimum {:.2})",
                density, span_days, quality.min_events_per_day
            ),
            "Extend collection or report results as anecdotal",
        ));
    }

    if let Some(window) = ctx.config.coverage {
        let declared = window.days();
        if declared > span_days * (1.0 + quality.coverage_slack) {
            issues.push(ValidationIssue::new(
                CATEGORY,
                Severity::Medium,
                format!(
                    "Declared window spans {:.0} days but events span {:.0} days",
                    declared, span_days
                ),
                "State the actual event span instead of the requested window",
            ));
        }
    }

    let max_gap_days = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds() as f64 / SECONDS_PER_DAY)
        .fold(0.0_f64, f64::max);
    if max_gap_days > quality.max_gap_days {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Low,
            format!("Largest gap between events is {:.1} days", max_gap_days),
            "Check the collector for outages during the gap",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures;
    use chrono::Duration;
    use sentiment_impact_core::CoverageWindow;

    #[test]
    fn dense_events_have_no_issues() {
        let events = fixtures::events(48, 1);
        let config = fixtures::config();
        let ctx = ValidationContext::new(&events, &[], &[], &config);

        assert!(check(&ctx).is_empty());
    }

    #[test]
    fn sparse_events_are_high() {
        // 20 events over ~3 months
        let events = fixtures::events(20, 110);
        let config = fixtures::config();
        let ctx = ValidationContext::new(&events, &[], &[], &config);

        let issues = check(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::High);
    }

    #[test]
    fn overstated_window_is_medium() {
        let events = fixtures::events(48, 1);
        let mut config = fixtures::config();
        config.coverage = Some(CoverageWindow {
            start: fixtures::start() - Duration::days(10),
            end: fixtures::start() + Duration::days(2),
        });
        let ctx = ValidationContext::new(&events, &[], &[], &config);

        let issues = check(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Medium);
    }

    #[test]
    fn long_gap_is_low() {
        let mut events = fixtures::events(40, 1);
        let mut late = fixtures::events(40, 1);
        for (i, event) in late.iter_mut().enumerate() {
            event.id = format!("late{i}");
            event.timestamp += Duration::days(20);
        }
        events.extend(late);
        let mut config = fixtures::config();
        config.quality.min_events_per_day = 0.5;
        let ctx = ValidationContext::new(&events, &[], &[], &config);

        let issues = check(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Low);
    }

    #[test]
    fn no_events_no_issues() {
        let config = fixtures::config();
        let ctx = ValidationContext::new(&[], &[], &[], &config);
        assert!(check(&ctx).is_empty());
    }
}
