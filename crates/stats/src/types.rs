//! Result types shared by every statistical test.

use serde::{Deserialize, Serialize};
use sentiment_impact_core::Flag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectSizeKind {
    PearsonR,
    SpearmanRho,
    CohensD,
    EtaSquared,
    EpsilonSquared,
    RankBiserial,
    RSquared,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub kind: EffectSizeKind,
    pub value: f64,
}

impl EffectSize {
    #[must_use]
    pub fn new(kind: EffectSizeKind, value: f64) -> Self {
        Self { kind, value }
    }
}

/// Outcome of one statistical test. A p-value never travels without its effect size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalResult {
    pub test_name: String,
    pub statistic: f64,
    pub p_value: f64,
    pub effect_size: EffectSize,
    /// Interval for the effect (coefficient, mean difference) when one is defined.
    pub confidence_interval: Option<(f64, f64)>,
    pub sample_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees_of_freedom: Option<f64>,
    /// Bonferroni-corrected p-value when the test belongs to a family.
    pub corrected_p_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Flag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl StatisticalResult {
    pub fn new(
        test_name: impl Into<String>,
        statistic: f64,
        p_value: f64,
        effect_size: EffectSize,
        sample_size: usize,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            statistic,
            p_value,
            effect_size,
            confidence_interval: None,
            sample_size,
            degrees_of_freedom: None,
            corrected_p_value: None,
            flags: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_confidence_interval(mut self, ci: (f64, f64)) -> Self {
        self.confidence_interval = Some(ci);
        self
    }

    #[must_use]
    pub fn with_degrees_of_freedom(mut self, df: f64) -> Self {
        self.degrees_of_freedom = Some(df);
        self
    }

    /// Adds a flag once.
    pub fn flag(&mut self, flag: Flag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    #[must_use]
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// The corrected p-value when present, else the raw one.
    #[must_use]
    pub fn decision_p_value(&self) -> f64 {
        self.corrected_p_value.unwrap_or(self.p_value)
    }

    /// Significant at `alpha` after correction and backed by a sufficient sample.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.decision_p_value() < alpha && !self.has_flag(Flag::InsufficientSample)
    }
}

/// Whether a budgeted computation ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Complete,
    Partial,
}

/// Bonferroni-corrected p-values: `min(1, p * m)` for a family of `m` tests.
#[must_use]
pub fn bonferroni(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len() as f64;
    p_values.iter().map(|p| (p * m).min(1.0)).collect()
}

/// Per-test threshold for a family of `m` tests at family-wise level `alpha`.
#[must_use]
pub fn bonferroni_alpha(alpha: f64, m: usize) -> f64 {
    alpha / m.max(1) as f64
}

/// Writes corrected p-values into every member of a family.
pub fn correct_family(results: &mut [StatisticalResult]) {
    let raw: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    for (result, corrected) in results.iter_mut().zip(bonferroni(&raw)) {
        result.corrected_p_value = Some(corrected);
    }
}
