//! Quality report types.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sentiment_impact_core::{CategoryWeights, SeverityPenalties};

/// The six fixed check categories, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityCategory {
    Completeness,
    Consistency,
    StatisticalValidity,
    MarketIntegration,
    TemporalCoverage,
    Methodology,
}

impl QualityCategory {
    pub const ALL: [Self; 6] = [
        Self::Completeness,
        Self::Consistency,
        Self::StatisticalValidity,
        Self::MarketIntegration,
        Self::TemporalCoverage,
        Self::Methodology,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completeness => "COMPLETENESS",
            Self::Consistency => "CONSISTENCY",
            Self::StatisticalValidity => "STATISTICAL_VALIDITY",
            Self::MarketIntegration => "MARKET_INTEGRATION",
            Self::TemporalCoverage => "TEMPORAL_COVERAGE",
            Self::Methodology => "METHODOLOGY",
        }
    }

    #[must_use]
    pub fn weight(&self, weights: &CategoryWeights) -> f64 {
        match self {
            Self::Completeness => weights.completeness,
            Self::Consistency => weights.consistency,
            Self::StatisticalValidity => weights.statistical_validity,
            Self::MarketIntegration => weights.market_integration,
            Self::TemporalCoverage => weights.temporal_coverage,
            Self::Methodology => weights.methodology,
        }
    }
}

/// Issue severity; declaration order is most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Points deducted from the category score.
    #[must_use]
    pub fn penalty(&self, penalties: &SeverityPenalties) -> f64 {
        match self {
            Self::Critical => penalties.critical,
            Self::High => penalties.high,
            Self::Medium => penalties.medium,
            Self::Low => penalties.low,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub category: QualityCategory,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

impl ValidationIssue {
    pub fn new(
        category: QualityCategory,
        severity: Severity,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            recommendation: recommendation.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    Passed,
    Warning,
    CriticalFailure,
}

impl QualityStatus {
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Passed => "Data quality sufficient for correlation claims",
            Self::Warning => "Usable with caveats - review issues before drawing conclusions",
            Self::CriticalFailure => "Data quality insufficient - findings are not reliable",
        }
    }
}

/// Input counts the checks were run against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub events: usize,
    pub labels: usize,
    pub impact_records: usize,
    pub resolved_baselines: usize,
    /// Distinct events with at least one resolved horizon.
    pub usable_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub status: QualityStatus,
    pub overall_score: f64,
    pub category_scores: BTreeMap<QualityCategory, f64>,
    /// Ordered by category, then severity, then emission order.
    pub issues: Vec<ValidationIssue>,
    pub summary: QualitySummary,
}

impl QualityReport {
    /// Issues of one category, in report order.
    pub fn issues_in(&self, category: QualityCategory) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    #[must_use]
    pub fn category_score(&self, category: QualityCategory) -> f64 {
        self.category_scores.get(&category).copied().unwrap_or(100.0)
    }

    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }

    /// Converts the report to JSON format.
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Converts the report to a human-readable text format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("=== Data Quality Report ===\n\n");
        output.push_str(&format!(
            "Status: {:?} ({:.1}/100)\n{}\n\n",
            self.status,
            self.overall_score,
            self.status.description()
        ));

        output.push_str(&format!(
            "Events: {}  Labels: {}  Impact records: {}  Resolved baselines: {}  Usable events: {}\n\n",
            self.summary.events,
            self.summary.labels,
            self.summary.impact_records,
            self.summary.resolved_baselines,
            self.summary.usable_events
        ));

        output.push_str("--- Category Scores ---\n");
        for category in QualityCategory::ALL {
            output.push_str(&format!(
                "{:<22} {:>5.1}\n",
                category.as_str(),
                self.category_score(category)
            ));
        }

        if !self.issues.is_empty() {
            output.push_str("\n--- Issues ---\n");
            for issue in &self.issues {
                output.push_str(&format!(
                    "[{}] {}: {}\n    -> {}\n",
                    issue.severity.as_str(),
                    issue.category.as_str(),
                    issue.message,
                    issue.recommendation
                ));
            }
        }

        output
    }
}
