//! Runs every check and assembles the [`QualityReport`].

use std::collections::BTreeMap;

use rayon::prelude::*;
use sentiment_impact_core::{
    validate_inputs, EngineConfig, EngineError, Event, ImpactRecord, SentimentLabel,
};

use crate::checks::CHECKS;
use crate::context::ValidationContext;
use crate::score;
use crate::types::{QualityReport, ValidationIssue};

/// Scores the inputs. Pure and deterministic.
///
/// Every check runs regardless of what the others find, so the report is
/// always complete. Data-quality problems become issues; only structurally
/// malformed input is an error.
///
/// # Errors
///
/// Returns `InputMalformed` for an empty event set, an empty event id or a
/// label confidence outside [0, 1], and `InvalidConfig` for a configuration
/// that fails its own validation.
pub fn validate(
    events: &[Event],
    labels: &[SentimentLabel],
    records: &[ImpactRecord],
    config: &EngineConfig,
) -> Result<QualityReport, EngineError> {
    config.validate()?;
    validate_inputs(events, labels, &BTreeMap::new())?;

    let ctx = ValidationContext::new(events, labels, records, config);
    let per_category: Vec<Vec<ValidationIssue>> = CHECKS
        .par_iter()
        .map(|(_, check)| {
            let mut issues = check(&ctx);
            // stable: keeps emission order within a severity
            issues.sort_by_key(|i| i.severity);
            issues
        })
        .collect();
    let issues: Vec<ValidationIssue> = per_category.into_iter().flatten().collect();

    Ok(build_report(issues, &ctx))
}

/// Scores an already-collected issue list against the context's config.
#[must_use]
pub fn build_report(issues: Vec<ValidationIssue>, ctx: &ValidationContext<'_>) -> QualityReport {
    let quality = ctx.quality();
    let category_scores = score::category_scores(&issues, quality);
    let overall_score = score::overall_score(&category_scores, quality);
    let status = score::status(overall_score, &category_scores, quality);

    tracing::info!(
        "Quality: {:?} ({:.1}/100), {} issues",
        status,
        overall_score,
        issues.len()
    );

    QualityReport {
        status,
        overall_score,
        category_scores,
        issues,
        summary: ctx.summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures;
    use crate::types::{QualityCategory, QualityStatus, Severity};
    use sentiment_impact_core::{SentimentCategory, SentimentLabel};

    fn documented() -> EngineConfig {
        let mut config = fixtures::config();
        config.methodology.classification_prompt = Some("Classify the post".to_string());
        config.methodology.collection_method = Some("Archive export".to_string());
        config.methodology.data_source = Some("Vendor 1m bars".to_string());
        config
    }

    fn labels(events: &[Event]) -> Vec<SentimentLabel> {
        events
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let category = SentimentCategory::ALL[i % 3];
                SentimentLabel::new(e.id.clone(), category, 0.8, "llm")
            })
            .collect()
    }

    #[test]
    fn healthy_dataset_passes() {
        let events = fixtures::events(240, 1);
        let records = fixtures::records(&events, "TSLA", 0);
        let report = validate(&events, &labels(&events), &records, &documented()).unwrap();

        assert_eq!(report.status, QualityStatus::Passed);
        assert!(report.issues.is_empty());
        assert!((report.overall_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn every_category_is_scored() {
        let events = fixtures::events(5, 1);
        let report = validate(&events, &[], &[], &fixtures::config()).unwrap();

        assert_eq!(report.category_scores.len(), 6);
        for category in QualityCategory::ALL {
            assert!(report.category_scores.contains_key(&category));
        }
    }

    #[test]
    fn issues_ordered_by_category_then_severity() {
        let events = fixtures::events(10, 24);
        let records = fixtures::records(&events, "TSLA", 2);
        let report = validate(&events, &[], &records, &fixtures::config()).unwrap();

        let keys: Vec<(QualityCategory, Severity)> =
            report.issues.iter().map(|i| (i.category, i.severity)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn malformed_label_is_fatal() {
        let events = fixtures::events(3, 1);
        let bad = vec![SentimentLabel::new("e000", SentimentCategory::Bullish, 1.5, "llm")];

        assert!(matches!(
            validate(&events, &bad, &[], &fixtures::config()),
            Err(EngineError::InputMalformed { .. })
        ));
    }

    #[test]
    fn empty_events_are_fatal() {
        assert!(validate(&[], &[], &[], &fixtures::config()).is_err());
    }

    #[test]
    fn validation_is_deterministic() {
        let events = fixtures::events(30, 7);
        let records = fixtures::records(&events, "TSLA", 4);
        let config = fixtures::config();

        let first = validate(&events, &[], &records, &config).unwrap();
        let second = validate(&events, &[], &records, &config).unwrap();
        assert_eq!(first, second);
    }
}
