//! Per-symbol statistical analysis over aligned impact records.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sentiment_impact_conditions::Partitions;
use sentiment_impact_core::{
    AnalysisConfig, EngineConfig, Event, ImpactRecord, SentimentEncoding, SentimentLabel,
};
use tracing::{debug, info};

use crate::correlation::{correlate, CorrelationMethod};
use crate::group::{compare_buckets, GroupComparison, GroupSample};
use crate::regression::{ols, RegressionResult};
use crate::robustness::{
    cross_validate, outlier_sensitivity, BootstrapResampler, BootstrapResult,
    CrossValidationResult, OutlierSensitivity,
};
use crate::types::{correct_family, EffectSize, StatisticalResult};

pub const REGRESSORS: [&str; 3] = ["sentiment", "engagement_thousands", "market_hours"];

/// One event's regressors and resolved price changes for a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub sentiment: f64,
    pub engagement: f64,
    pub market_hours: bool,
    /// Effective change per horizon; unresolved horizons are absent.
    pub changes: BTreeMap<u32, f64>,
}

impl Sample {
    fn regressors(&self) -> Vec<f64> {
        vec![
            self.sentiment,
            self.engagement / 1_000.0,
            if self.market_hours { 1.0 } else { 0.0 },
        ]
    }
}

/// Joins events with their first label and first record.
///
/// Events without a label or record are skipped, as are repeated event ids
/// after the first occurrence in input order. Output is ordered by timestamp,
/// then event id.
#[must_use]
pub fn build_samples(
    events: &[Event],
    labels: &[SentimentLabel],
    records: &[ImpactRecord],
    config: &EngineConfig,
) -> Vec<Sample> {
    let mut label_by_id: HashMap<&str, &SentimentLabel> = HashMap::new();
    for label in labels {
        label_by_id.entry(label.event_id.as_str()).or_insert(label);
    }
    let mut record_by_id: HashMap<&str, &ImpactRecord> = HashMap::new();
    for record in records {
        record_by_id.entry(record.event_id.as_str()).or_insert(record);
    }

    let reshare_weight = config.partition.reshare_weight;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut samples: Vec<Sample> = events
        .iter()
        .filter(|event| seen.insert(event.id.as_str()))
        .filter_map(|event| {
            let label = label_by_id.get(event.id.as_str())?;
            let record = record_by_id.get(event.id.as_str())?;
            let sentiment = match config.analysis.encoding {
                SentimentEncoding::Categorical => label.category.numeric(),
                SentimentEncoding::ConfidenceWeighted => label.signed_score(),
            };
            let changes = record
                .horizon_results
                .iter()
                .filter_map(|(h, result)| result.effective_change_f64().map(|v| (*h, v)))
                .collect();
            Some(Sample {
                event_id: event.id.clone(),
                timestamp: event.timestamp,
                sentiment,
                engagement: event.engagement.score(reshare_weight),
                market_hours: config.calendar.is_market_open(event.timestamp),
                changes,
            })
        })
        .collect();

    samples.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.event_id.cmp(&b.event_id))
    });
    samples
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub method: CorrelationMethod,
    pub horizon_hours: u32,
    pub result: StatisticalResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robustness {
    pub outliers: Option<OutlierSensitivity>,
    pub bootstrap: Option<BootstrapResult>,
    pub cross_validation: CrossValidationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    Correlation,
    GroupDifference,
}

/// A result that cleared the corrected significance threshold on eligible data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub description: String,
    pub horizon_hours: u32,
    pub p_value: f64,
    pub corrected_p_value: Option<f64>,
    pub effect_size: EffectSize,
    pub confidence_interval: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub sample_size: usize,
    pub correlations: Vec<CorrelationResult>,
    pub group_comparisons: Vec<GroupComparison>,
    pub regression: RegressionResult,
    pub robustness: Robustness,
    pub significant_findings: Vec<Finding>,
}

pub struct Analyzer {
    config: AnalysisConfig,
    horizons: Vec<u32>,
    min_bucket_size: usize,
}

impl Analyzer {
    #[must_use]
    pub fn new(config: AnalysisConfig, horizons: Vec<u32>, min_bucket_size: usize) -> Self {
        Self {
            config,
            horizons,
            min_bucket_size,
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.analysis.clone(),
            config.alignment.horizons_hours.clone(),
            config.partition.min_bucket_size,
        )
    }

    fn paired(samples: &[Sample], horizon: u32) -> (Vec<String>, Vec<f64>, Vec<f64>) {
        let mut ids = Vec::new();
        let mut x = Vec::new();
        let mut y = Vec::new();
        for sample in samples {
            if let Some(change) = sample.changes.get(&horizon) {
                ids.push(sample.event_id.clone());
                x.push(sample.sentiment);
                y.push(*change);
            }
        }
        (ids, x, y)
    }

    /// Pearson and Spearman per horizon; each method's horizons form one Bonferroni family.
    #[must_use]
    pub fn correlations(&self, samples: &[Sample]) -> Vec<CorrelationResult> {
        let mut out = Vec::new();
        for method in CorrelationMethod::ALL {
            let mut family: Vec<StatisticalResult> = self
                .horizons
                .iter()
                .map(|h| {
                    let (_, x, y) = Self::paired(samples, *h);
                    correlate(method, &x, &y, self.config.confidence_level, self.config.min_correlation_n)
                })
                .collect();
            correct_family(&mut family);
            out.extend(
                self.horizons
                    .iter()
                    .zip(family)
                    .map(|(h, result)| CorrelationResult {
                        method,
                        horizon_hours: *h,
                        result,
                    }),
            );
        }
        out
    }

    /// Compares buckets of every partition at every horizon.
    #[must_use]
    pub fn group_comparisons(&self, samples: &[Sample], partitions: &Partitions) -> Vec<GroupComparison> {
        let by_id: HashMap<&str, &Sample> = samples.iter().map(|s| (s.event_id.as_str(), s)).collect();

        let jobs: Vec<(&str, u32)> = partitions
            .partition_names()
            .into_iter()
            .flat_map(|p| self.horizons.iter().map(move |h| (p, *h)))
            .collect();

        jobs.par_iter()
            .filter_map(|(partition, horizon)| {
                let groups: Vec<GroupSample> = partitions
                    .buckets_of(partition)
                    .into_iter()
                    .map(|bucket| {
                        let values = bucket
                            .event_ids
                            .iter()
                            .filter_map(|id| by_id.get(id.as_str())?.changes.get(horizon).copied())
                            .collect();
                        GroupSample::new(bucket.bucket_label.clone(), values, bucket.len() >= self.min_bucket_size)
                    })
                    .collect();
                compare_buckets(
                    partition,
                    *horizon,
                    &groups,
                    self.config.normality_alpha,
                    self.config.confidence_level,
                )
            })
            .collect()
    }

    /// OLS of the primary-horizon change on sentiment, engagement (thousands) and market hours.
    #[must_use]
    pub fn regression(&self, samples: &[Sample]) -> RegressionResult {
        let (rows, y) = self.regression_data(samples);
        ols(
            &format!("pct_change_{}h", self.config.primary_horizon),
            &REGRESSORS,
            &rows,
            &y,
            self.config.confidence_level,
        )
    }

    fn regression_data(&self, samples: &[Sample]) -> (Vec<Vec<f64>>, Vec<f64>) {
        samples
            .iter()
            .filter_map(|s| {
                s.changes
                    .get(&self.config.primary_horizon)
                    .map(|change| (s.regressors(), *change))
            })
            .unzip()
    }

    #[must_use]
    pub fn robustness(&self, samples: &[Sample]) -> Robustness {
        let (ids, x, y) = Self::paired(samples, self.config.primary_horizon);
        let method = CorrelationMethod::Pearson;

        let outliers = (!x.is_empty()).then(|| outlier_sensitivity(method, &ids, &x, &y, self.config.outlier_z));
        let bootstrap = BootstrapResampler::new(self.config.bootstrap.clone()).bootstrap_correlation(method, &x, &y);

        let (rows, targets) = self.regression_data(samples);
        let cross_validation = cross_validate(
            &rows,
            &targets,
            self.config.cv_folds,
            self.config.cv_max_duration_ms.map(Duration::from_millis),
        );

        Robustness {
            outliers,
            bootstrap,
            cross_validation,
        }
    }

    fn findings(&self, correlations: &[CorrelationResult], comparisons: &[GroupComparison]) -> Vec<Finding> {
        let alpha = self.config.alpha;
        let mut findings: Vec<Finding> = correlations
            .iter()
            .filter(|c| c.result.is_significant(alpha))
            .map(|c| Finding {
                kind: FindingKind::Correlation,
                description: format!(
                    "{} correlation between sentiment and {}h change",
                    c.method.as_str(),
                    c.horizon_hours
                ),
                horizon_hours: c.horizon_hours,
                p_value: c.result.p_value,
                corrected_p_value: c.result.corrected_p_value,
                effect_size: c.result.effect_size,
                confidence_interval: c.result.confidence_interval,
            })
            .collect();

        for comparison in comparisons {
            findings.extend(comparison.significant_pairs(alpha).map(|pair| Finding {
                kind: FindingKind::GroupDifference,
                description: format!(
                    "{}: {} vs {} at {}h",
                    comparison.partition_name, pair.bucket_a, pair.bucket_b, comparison.horizon_hours
                ),
                horizon_hours: comparison.horizon_hours,
                p_value: pair.result.p_value,
                corrected_p_value: pair.result.corrected_p_value,
                effect_size: pair.result.effect_size,
                confidence_interval: pair.result.confidence_interval,
            }));
        }
        findings
    }

    /// Runs every analysis for one symbol.
    #[must_use]
    pub fn analyze(&self, symbol: &str, samples: &[Sample], partitions: &Partitions) -> SymbolAnalysis {
        let correlations = self.correlations(samples);
        let group_comparisons = self.group_comparisons(samples, partitions);
        let regression = self.regression(samples);
        let robustness = self.robustness(samples);
        let significant_findings = self.findings(&correlations, &group_comparisons);

        debug!(
            symbol,
            comparisons = group_comparisons.len(),
            "Analysis details computed"
        );
        info!(
            "Analyzed {} samples for {}: {} significant findings",
            samples.len(),
            symbol,
            significant_findings.len()
        );

        SymbolAnalysis {
            symbol: symbol.to_string(),
            sample_size: samples.len(),
            correlations,
            group_comparisons,
            regression,
            robustness,
            significant_findings,
        }
    }
}
