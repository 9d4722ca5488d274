//! Category and overall scoring.

use std::collections::BTreeMap;

use sentiment_impact_core::QualityConfig;

use crate::types::{QualityCategory, QualityStatus, ValidationIssue};

const FULL_SCORE: f64 = 100.0;

/// 100 minus the severity penalties of the category's issues, floored at 0.
#[must_use]
pub fn category_score(
    category: QualityCategory,
    issues: &[ValidationIssue],
    config: &QualityConfig,
) -> f64 {
    let deducted: f64 = issues
        .iter()
        .filter(|i| i.category == category)
        .map(|i| i.severity.penalty(&config.penalties))
        .sum();
    (FULL_SCORE - deducted).max(0.0)
}

#[must_use]
pub fn category_scores(
    issues: &[ValidationIssue],
    config: &QualityConfig,
) -> BTreeMap<QualityCategory, f64> {
    QualityCategory::ALL
        .iter()
        .map(|c| (*c, category_score(*c, issues, config)))
        .collect()
}

/// Weighted sum of category scores, clamped to [0, 100].
#[must_use]
pub fn overall_score(scores: &BTreeMap<QualityCategory, f64>, config: &QualityConfig) -> f64 {
    scores
        .iter()
        .map(|(category, score)| category.weight(&config.weights) * score)
        .sum::<f64>()
        .clamp(0.0, FULL_SCORE)
}

/// A category at zero fails the report outright; otherwise the overall score decides.
#[must_use]
pub fn status(
    overall: f64,
    scores: &BTreeMap<QualityCategory, f64>,
    config: &QualityConfig,
) -> QualityStatus {
    if scores.values().any(|s| *s <= 0.0) {
        return QualityStatus::CriticalFailure;
    }
    if overall >= config.passed_min_score {
        QualityStatus::Passed
    } else if overall >= config.warning_min_score {
        QualityStatus::Warning
    } else {
        QualityStatus::CriticalFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn issue(category: QualityCategory, severity: Severity) -> ValidationIssue {
        ValidationIssue::new(category, severity, "m", "r")
    }

    #[test]
    fn critical_issue_deducts_exactly_forty() {
        let config = QualityConfig::default();
        let mut issues = vec![issue(QualityCategory::Consistency, Severity::Low)];
        let before = category_score(QualityCategory::Consistency, &issues, &config);

        issues.push(issue(QualityCategory::Consistency, Severity::Critical));
        let after = category_score(QualityCategory::Consistency, &issues, &config);

        assert_eq!(before - after, 40.0);
    }

    #[test]
    fn score_floors_at_zero() {
        let config = QualityConfig::default();
        let issues: Vec<_> = (0..3)
            .map(|_| issue(QualityCategory::MarketIntegration, Severity::Critical))
            .collect();

        assert_eq!(category_score(QualityCategory::MarketIntegration, &issues, &config), 0.0);
    }

    #[test]
    fn overall_is_weighted_sum() {
        let config = QualityConfig::default();
        let issues = vec![issue(QualityCategory::StatisticalValidity, Severity::High)];
        let scores = category_scores(&issues, &config);

        // 100 - 0.25 * 20
        let overall = overall_score(&scores, &config);
        assert!((overall - 95.0).abs() < 1e-9, "overall was {overall}");
        assert_eq!(status(overall, &scores, &config), QualityStatus::Passed);
    }

    #[test]
    fn status_thresholds() {
        let config = QualityConfig::default();
        let scores = category_scores(&[], &config);

        assert_eq!(status(80.0, &scores, &config), QualityStatus::Passed);
        assert_eq!(status(79.9, &scores, &config), QualityStatus::Warning);
        assert_eq!(status(50.0, &scores, &config), QualityStatus::Warning);
        assert_eq!(status(49.9, &scores, &config), QualityStatus::CriticalFailure);
    }

    #[test]
    fn zero_category_forces_critical_failure() {
        let config = QualityConfig::default();
        let issues: Vec<_> = (0..3)
            .map(|_| issue(QualityCategory::MarketIntegration, Severity::Critical))
            .collect();
        let scores = category_scores(&issues, &config);
        let overall = overall_score(&scores, &config);

        // 80 overall would pass on its own
        assert!((overall - 80.0).abs() < 1e-9);
        assert_eq!(status(overall, &scores, &config), QualityStatus::CriticalFailure);
    }
}
