//! Consistency: identifiers, labels, and the declared coverage window agree.

use std::collections::{BTreeMap, BTreeSet};

use crate::context::ValidationContext;
use crate::types::{QualityCategory, Severity, ValidationIssue};

const CATEGORY: QualityCategory = QualityCategory::Consistency;

pub fn check(ctx: &ValidationContext<'_>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut id_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in ctx.events {
        *id_counts.entry(event.id.as_str()).or_default() += 1;
    }
    let duplicated: Vec<&str> = id_counts
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(id, _)| *id)
        .collect();
    if !duplicated.is_empty() {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::High,
            format!(
                "{} event ids appear more than once (first: {})",
                duplicated.len(),
                duplicated[0]
            ),
            "Deduplicate events before alignment; duplicates double-count impact",
        ));
    }

    if let Some(window) = ctx.config.coverage {
        let outside = ctx
            .events
            .iter()
            .filter(|e| !window.contains(e.timestamp))
            .count();
        if outside > 0 {
            issues.push(ValidationIssue::new(
                CATEGORY,
                Severity::Medium,
                format!(
                    "{} events fall outside the declared window {} to {}",
                    outside,
                    window.start.format("%Y-%m-%d"),
                    window.end.format("%Y-%m-%d")
                ),
                "Filter events to the declared window or correct the window",
            ));
        }
    }

    let mut label_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in ctx.labels {
        *label_counts.entry(label.event_id.as_str()).or_default() += 1;
    }

    let unlabeled = id_counts
        .keys()
        .filter(|id| !label_counts.contains_key(*id))
        .count();
    if unlabeled > 0 {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Medium,
            format!("{} events have no sentiment label", unlabeled),
            "Classify every event; unlabeled events fall back to keyword sentiment",
        ));
    }

    let known: BTreeSet<&str> = id_counts.keys().copied().collect();
    let orphaned = label_counts.keys().filter(|id| !known.contains(*id)).count();
    if orphaned > 0 {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Low,
            format!("{} labels reference unknown events", orphaned),
            "Drop labels for events outside this dataset",
        ));
    }

    let relabeled = label_counts.values().filter(|n| **n > 1).count();
    if relabeled > 0 {
        issues.push(ValidationIssue::new(
            CATEGORY,
            Severity::Low,
            format!("{} events carry more than one label; the first is used", relabeled),
            "Keep one label per event",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures;
    use chrono::Duration;
    use sentiment_impact_core::{CoverageWindow, SentimentCategory, SentimentLabel};

    fn labels_for(events: &[sentiment_impact_core::Event]) -> Vec<SentimentLabel> {
        events
            .iter()
            .map(|e| SentimentLabel::new(e.id.clone(), SentimentCategory::Bullish, 0.8, "llm"))
            .collect()
    }

    #[test]
    fn clean_inputs_have_no_issues() {
        let events = fixtures::events(5, 24);
        let labels = labels_for(&events);
        let config = fixtures::config();
        let ctx = ValidationContext::new(&events, &labels, &[], &config);

        assert!(check(&ctx).is_empty());
    }

    #[test]
    fn duplicate_ids_are_high() {
        let mut events = fixtures::events(3, 24);
        events.push(events[0].clone());
        let labels = labels_for(&events[..3]);
        let config = fixtures::config();
        let ctx = ValidationContext::new(&events, &labels, &[], &config);

        let issues = check(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::High);
        assert!(issues[0].message.contains("e000"));
    }

    #[test]
    fn events_outside_window_are_medium() {
        let events = fixtures::events(5, 24);
        let labels = labels_for(&events);
        let mut config = fixtures::config();
        config.coverage = Some(CoverageWindow {
            start: fixtures::start(),
            end: fixtures::start() + Duration::days(2),
        });
        let ctx = ValidationContext::new(&events, &labels, &[], &config);

        let issues = check(&ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Medium);
        assert!(issues[0].message.starts_with("2 events"));
    }

    #[test]
    fn label_mismatches_are_reported() {
        let events = fixtures::events(3, 24);
        let mut labels = labels_for(&events[..2]);
        labels.push(labels[0].clone());
        labels.push(SentimentLabel::new("ghost", SentimentCategory::Neutral, 0.5, "llm"));
        let config = fixtures::config();
        let ctx = ValidationContext::new(&events, &labels, &[], &config);

        let severities: Vec<Severity> = check(&ctx).iter().map(|i| i.severity).collect();
        assert_eq!(severities, vec![Severity::Medium, Severity::Low, Severity::Low]);
    }
}
