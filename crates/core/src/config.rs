use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::MarketCalendar;
use crate::error::EngineError;

/// Complete engine configuration. Every field has a documented default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Symbols to align against. Symbols present in the price map are added automatically.
    pub symbols: Vec<String>,
    /// Coverage window the study claims to cover.
    pub coverage: Option<CoverageWindow>,
    pub alignment: AlignmentConfig,
    pub calendar: MarketCalendar,
    pub partition: PartitionConfig,
    pub quality: QualityConfig,
    pub analysis: AnalysisConfig,
    pub methodology: MethodologyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CoverageWindow {
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    #[must_use]
    pub fn days(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 86_400.0
    }
}

/// What to do when a horizon target falls outside market hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OffHoursPolicy {
    /// Use the next available trading bar and mark the horizon `ADJUSTED`.
    #[default]
    ForwardFill,
    /// Mark the horizon `MISSING`.
    MarkMissing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub horizons_hours: Vec<u32>,
    pub tolerance_minutes: i64,
    pub off_hours_policy: OffHoursPolicy,
    /// Upper bound on how far a forward fill may reach past the target.
    pub max_forward_fill_hours: i64,
    /// Decimal places kept on `pct_change`.
    pub precision_dp: u32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            horizons_hours: vec![1, 6, 12, 24],
            tolerance_minutes: 5,
            off_hours_policy: OffHoursPolicy::ForwardFill,
            max_forward_fill_hours: 96,
            precision_dp: 2,
        }
    }
}

impl AlignmentConfig {
    #[must_use]
    pub fn tolerance(&self) -> Duration {
        Duration::minutes(self.tolerance_minutes)
    }

    #[must_use]
    pub fn max_forward_fill(&self) -> Duration {
        Duration::hours(self.max_forward_fill_hours)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngagementThresholds {
    /// Scores at or above this are MEDIUM.
    pub medium: f64,
    /// Scores at or above this are HIGH.
    pub high: f64,
}

impl Default for EngagementThresholds {
    fn default() -> Self {
        Self {
            medium: 10_000.0,
            high: 50_000.0,
        }
    }
}

/// A labelled keyword set. Single words match case-insensitively as word prefixes,
/// phrases containing a space as substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub label: String,
    pub keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}

/// A boolean flag partition defined by regular expressions (any match sets the flag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    pub name: String,
    pub patterns: Vec<String>,
}

impl PatternSet {
    pub fn new(name: &str, patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Weight of one reshare relative to one like in the engagement score.
    pub reshare_weight: f64,
    pub engagement: EngagementThresholds,
    /// Topic keyword sets in priority order; first match wins.
    pub topics: Vec<KeywordSet>,
    pub flags: Vec<PatternSet>,
    /// Buckets smaller than this never appear in a significant finding.
    pub min_bucket_size: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            reshare_weight: 2.0,
            engagement: EngagementThresholds::default(),
            topics: vec![
                KeywordSet::new(
                    "PRODUCT",
                    &[
                        "model", "models", "launch", "launches", "launched", "launching",
                        "release", "releases", "released", "feature", "features", "unveil",
                        "unveiled", "product", "products",
                    ],
                ),
                KeywordSet::new(
                    "FINANCIAL",
                    &[
                        "earnings", "revenue", "revenues", "profit", "profits", "stock",
                        "shares", "guidance", "quarter", "quarterly",
                    ],
                ),
                KeywordSet::new(
                    "TECHNOLOGY",
                    &[
                        "ai", "autopilot", "software", "chip", "chips", "fsd", "robot",
                        "robots", "robotaxi",
                    ],
                ),
                KeywordSet::new(
                    "MANUFACTURING",
                    &[
                        "factory", "factories", "production", "gigafactory", "supply",
                        "delivery", "deliveries",
                    ],
                ),
                KeywordSet::new(
                    "SAFETY",
                    &["safety", "crash", "crashes", "recall", "recalls", "investigation"],
                ),
            ],
            flags: vec![
                PatternSet::new(
                    "forward_looking",
                    &[r"(?i)\b(will|future|soon|next|coming|plan(ned)?)\b"],
                ),
                PatternSet::new(
                    "product_announcement",
                    &[r"(?i)\b(launch(ing|ed)?|releas(e|ing|ed)|announc(e|ing|ed)|unveil(ing|ed)?|introduc(e|ing|ed))\b"],
                ),
                PatternSet::new("contains_metrics", &[r"\d+%", r"\$\d+", r"\bQ[1-4]\b", r"\d{2,}"]),
            ],
            min_bucket_size: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeverityPenalties {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SeverityPenalties {
    fn default() -> Self {
        Self {
            critical: 40.0,
            high: 20.0,
            medium: 10.0,
            low: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub completeness: f64,
    pub consistency: f64,
    pub statistical_validity: f64,
    pub market_integration: f64,
    pub temporal_coverage: f64,
    pub methodology: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            completeness: 0.20,
            consistency: 0.15,
            statistical_validity: 0.25,
            market_integration: 0.20,
            temporal_coverage: 0.10,
            methodology: 0.10,
        }
    }
}

impl CategoryWeights {
    #[must_use]
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.completeness,
            self.consistency,
            self.statistical_validity,
            self.market_integration,
            self.temporal_coverage,
            self.methodology,
        ]
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

/// Minimum usable sample per analysis type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MinimumSamples {
    pub basic_correlation: usize,
    pub statistical_significance: usize,
    pub subgroup_analysis: usize,
    pub time_series_analysis: usize,
}

impl Default for MinimumSamples {
    fn default() -> Self {
        Self {
            basic_correlation: 30,
            statistical_significance: 100,
            subgroup_analysis: 50,
            time_series_analysis: 200,
        }
    }
}

impl MinimumSamples {
    #[must_use]
    pub fn entries(&self) -> [(&'static str, usize); 4] {
        [
            ("basic_correlation", self.basic_correlation),
            ("statistical_significance", self.statistical_significance),
            ("subgroup_analysis", self.subgroup_analysis),
            ("time_series_analysis", self.time_series_analysis),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub penalties: SeverityPenalties,
    pub weights: CategoryWeights,
    /// All-horizon-missing fraction above which completeness raises HIGH.
    pub missing_issue_threshold: f64,
    /// All-horizon-missing fraction above which the issue becomes CRITICAL.
    pub critical_missing_threshold: f64,
    pub min_samples: MinimumSamples,
    /// Resolved-baseline fraction below which market integration is CRITICAL.
    pub min_resolved_fraction: f64,
    /// Resolved-baseline fraction below which market integration is HIGH.
    pub warn_resolved_fraction: f64,
    pub min_events_per_day: f64,
    /// Allowed excess of the declared window over the actual span (0.25 = 25%).
    pub coverage_slack: f64,
    pub max_gap_days: f64,
    /// Share of one sentiment category above which there is no contrast to study.
    pub dominant_sentiment_share: f64,
    /// Share of keyword-fallback labels above which methodology raises LOW.
    pub fallback_share: f64,
    pub passed_min_score: f64,
    pub warning_min_score: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            penalties: SeverityPenalties::default(),
            weights: CategoryWeights::default(),
            missing_issue_threshold: 0.10,
            critical_missing_threshold: 0.50,
            min_samples: MinimumSamples::default(),
            min_resolved_fraction: 0.50,
            warn_resolved_fraction: 0.80,
            min_events_per_day: 1.0,
            coverage_slack: 0.25,
            max_gap_days: 14.0,
            dominant_sentiment_share: 0.90,
            fallback_share: 0.50,
            passed_min_score: 80.0,
            warning_min_score: 50.0,
        }
    }
}

/// Numeric encoding of sentiment used as the correlation/regression regressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentEncoding {
    /// +1 / 0 / -1.
    Categorical,
    /// Category sign times classifier confidence.
    #[default]
    ConfidenceWeighted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub iterations: usize,
    pub confidence_level: f64,
    pub seed: u64,
    /// Wall-clock budget; exceeding it yields a `PARTIAL` result.
    pub max_duration_ms: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            confidence_level: 0.95,
            seed: 42,
            max_duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Family-wise significance level.
    pub alpha: f64,
    pub confidence_level: f64,
    /// Below this effective N a correlation is flagged `INSUFFICIENT_SAMPLE`.
    pub min_correlation_n: usize,
    pub encoding: SentimentEncoding,
    pub outlier_z: f64,
    pub normality_alpha: f64,
    /// Horizon used for the primary correlation, bootstrap, and regression.
    pub primary_horizon: u32,
    pub cv_folds: usize,
    pub cv_max_duration_ms: Option<u64>,
    pub bootstrap: BootstrapConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            confidence_level: 0.95,
            min_correlation_n: 30,
            encoding: SentimentEncoding::ConfidenceWeighted,
            outlier_z: 3.0,
            normality_alpha: 0.05,
            primary_horizon: 24,
            cv_folds: 5,
            cv_max_duration_ms: None,
            bootstrap: BootstrapConfig::default(),
        }
    }
}

/// Study metadata whose absence is reported by the methodology check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodologyConfig {
    pub classification_prompt: Option<String>,
    pub collection_method: Option<String>,
    pub data_source: Option<String>,
}

impl EngineConfig {
    /// Checks the configuration's own invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first violated invariant.
    pub fn validate(&self) -> Result<(), EngineError> {
        let horizons = &self.alignment.horizons_hours;
        if horizons.is_empty() {
            return Err(EngineError::invalid_config("horizon list is empty"));
        }
        if horizons.contains(&0) {
            return Err(EngineError::invalid_config("horizons must be positive"));
        }
        let mut sorted = horizons.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != horizons.len() {
            return Err(EngineError::invalid_config("horizons must be unique"));
        }
        if !horizons.contains(&self.analysis.primary_horizon) {
            return Err(EngineError::invalid_config(format!(
                "primary horizon {}h is not in the horizon list",
                self.analysis.primary_horizon
            )));
        }
        if self.alignment.tolerance_minutes < 0 {
            return Err(EngineError::invalid_config("tolerance must be non-negative"));
        }

        let weights = self.quality.weights;
        if weights.as_array().iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(EngineError::invalid_config("category weights must be non-negative"));
        }
        if (weights.total() - 1.0).abs() > 1e-6 {
            return Err(EngineError::invalid_config(format!(
                "category weights sum to {:.6}, expected 1",
                weights.total()
            )));
        }

        let engagement = self.partition.engagement;
        if engagement.medium >= engagement.high {
            return Err(EngineError::invalid_config(
                "engagement thresholds must satisfy medium < high",
            ));
        }

        if self.analysis.cv_folds < 2 {
            return Err(EngineError::invalid_config("cv_folds must be at least 2"));
        }
        for (name, level) in [
            ("analysis.confidence_level", self.analysis.confidence_level),
            ("bootstrap.confidence_level", self.analysis.bootstrap.confidence_level),
            ("analysis.alpha", self.analysis.alpha),
        ] {
            if !(level > 0.0 && level < 1.0) {
                return Err(EngineError::invalid_config(format!("{name} must lie in (0, 1)")));
            }
        }

        if let Some(window) = self.coverage {
            if window.end < window.start {
                return Err(EngineError::invalid_config("coverage window ends before it starts"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.alignment.horizons_hours, vec![1, 6, 12, 24]);
        assert_eq!(config.alignment.tolerance_minutes, 5);
        assert_eq!(config.partition.min_bucket_size, 5);
        assert_eq!(config.analysis.bootstrap.iterations, 10_000);
        assert_eq!(config.analysis.cv_folds, 5);
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!((CategoryWeights::default().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_bad_weights() {
        let mut config = EngineConfig::default();
        config.quality.weights.methodology = 0.3;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_or_empty_horizons() {
        let mut config = EngineConfig::default();
        config.alignment.horizons_hours = vec![1, 1];
        assert!(config.validate().is_err());

        config.alignment.horizons_hours = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_engagement_thresholds() {
        let mut config = EngineConfig::default();
        config.partition.engagement.medium = 60_000.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn coverage_window_days() {
        let window = CoverageWindow {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0).unwrap(),
        };
        assert!((window.days() - 10.5).abs() < 1e-9);
    }

    #[test]
    fn config_deserializes_partial_json() {
        let json = r#"{"symbols": ["TSLA"], "alignment": {"horizons_hours": [1, 24]}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.symbols, vec!["TSLA".to_string()]);
        assert_eq!(config.alignment.horizons_hours, vec![1, 24]);
        assert_eq!(config.alignment.tolerance_minutes, 5);
        assert_eq!(config.analysis.primary_horizon, 24);
    }
}
