//! Correlation between a sentiment encoding and price change.
//!
//! The p-value uses the transformation `t = r * sqrt(n-2) / sqrt(1 - r^2)`,
//! which follows a t-distribution with n-2 degrees of freedom. The interval
//! comes from the Fisher z transform.

use serde::{Deserialize, Serialize};
use sentiment_impact_core::Flag;

use crate::descriptive::{pearson, spearman};
use crate::distributions::{normal_quantile, t_two_tailed};
use crate::types::{EffectSize, EffectSizeKind, StatisticalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

impl CorrelationMethod {
    pub const ALL: [CorrelationMethod; 2] = [CorrelationMethod::Pearson, CorrelationMethod::Spearman];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
        }
    }

    fn effect_kind(self) -> EffectSizeKind {
        match self {
            CorrelationMethod::Pearson => EffectSizeKind::PearsonR,
            CorrelationMethod::Spearman => EffectSizeKind::SpearmanRho,
        }
    }

    #[must_use]
    pub fn coefficient(self, x: &[f64], y: &[f64]) -> Option<f64> {
        match self {
            CorrelationMethod::Pearson => pearson(x, y),
            CorrelationMethod::Spearman => spearman(x, y),
        }
    }
}

/// Two-tailed p-value for a correlation coefficient over `n` pairs.
#[must_use]
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }

    // avoid division by zero at |r| = 1
    let r_clamped = r.clamp(-0.999_999_999, 0.999_999_999);
    let df = n as f64 - 2.0;
    let t_stat = r_clamped * (df / (1.0 - r_clamped * r_clamped)).sqrt();
    t_two_tailed(t_stat, df)
}

/// Fisher-z confidence interval for `r`; `None` below four pairs.
#[must_use]
pub fn fisher_interval(r: f64, n: usize, confidence_level: f64) -> Option<(f64, f64)> {
    if n < 4 {
        return None;
    }
    let z = r.clamp(-0.999_999_999, 0.999_999_999).atanh();
    let se = 1.0 / (n as f64 - 3.0).sqrt();
    let crit = normal_quantile(1.0 - (1.0 - confidence_level) / 2.0)?;
    Some(((z - crit * se).tanh(), (z + crit * se).tanh()))
}

/// Correlates `x` with `y`.
///
/// Always returns a result. Fewer than `min_n` pairs sets `INSUFFICIENT_SAMPLE`;
/// a constant series reports r = 0 with p = 1 and a warning.
pub fn correlate(
    method: CorrelationMethod,
    x: &[f64],
    y: &[f64],
    confidence_level: f64,
    min_n: usize,
) -> StatisticalResult {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);

    let mut result = match method.coefficient(x, y) {
        Some(r) => {
            let df = n as f64 - 2.0;
            let t_stat = if n > 2 {
                let rc = r.clamp(-0.999_999_999, 0.999_999_999);
                rc * (df / (1.0 - rc * rc)).sqrt()
            } else {
                0.0
            };
            let mut result = StatisticalResult::new(
                method.as_str(),
                t_stat,
                correlation_p_value(r, n),
                EffectSize::new(method.effect_kind(), r),
                n,
            );
            if n > 2 {
                result.degrees_of_freedom = Some(df);
            }
            result.confidence_interval = fisher_interval(r, n, confidence_level);
            result
        }
        None => {
            let mut result = StatisticalResult::new(
                method.as_str(),
                0.0,
                1.0,
                EffectSize::new(method.effect_kind(), 0.0),
                n,
            );
            result.warn("correlation undefined: a series has zero variance or fewer than two values");
            result
        }
    };

    if n < min_n {
        result.flag(Flag::InsufficientSample);
        result.warn(format!("{} pairs is below the minimum of {}", n, min_n));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================
    // P-value
    // ============================================

    #[test]
    fn p_value_small_sample_is_one() {
        assert_eq!(correlation_p_value(0.9, 2), 1.0);
    }

    #[test]
    fn p_value_strong_correlation_is_small() {
        let p = correlation_p_value(0.8, 30);
        assert!(p < 0.0001, "p was {p}");
    }

    #[test]
    fn p_value_zero_correlation_is_one() {
        let p = correlation_p_value(0.0, 50);
        assert!((p - 1.0).abs() < 1e-9, "p was {p}");
    }

    #[test]
    fn p_value_matches_t_table() {
        // r = 0.361 at n = 30 sits at the two-tailed 5% critical value
        let p = correlation_p_value(0.361, 30);
        assert!((p - 0.05).abs() < 0.002, "p was {p}");
    }

    // ============================================
    // Interval and result
    // ============================================

    #[test]
    fn fisher_interval_contains_estimate() {
        let (lo, hi) = fisher_interval(0.4, 50, 0.95).unwrap();
        assert!(lo < 0.4 && 0.4 < hi);
        assert!(lo > 0.13 && lo < 0.16, "lower was {lo}");
        assert!(hi > 0.6 && hi < 0.63, "upper was {hi}");
        assert!(fisher_interval(0.4, 3, 0.95).is_none());
    }

    #[test]
    fn small_sample_is_computed_and_flagged() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| v * 2.0 + 1.0).collect();

        let result = correlate(CorrelationMethod::Pearson, &x, &y, 0.95, 30);
        assert!((result.effect_size.value - 1.0).abs() < 1e-9);
        assert!(result.has_flag(Flag::InsufficientSample));
        assert!(result.confidence_interval.is_some());
        assert!(!result.is_significant(0.05));
    }

    #[test]
    fn constant_series_reports_zero() {
        let x: Vec<f64> = (0..40).map(f64::from).collect();
        let y = vec![1.5; 40];

        let result = correlate(CorrelationMethod::Spearman, &x, &y, 0.95, 30);
        assert_eq!(result.effect_size.value, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(result.confidence_interval.is_none());
        assert_eq!(result.warnings.len(), 1);
        assert!(!result.has_flag(Flag::InsufficientSample));
    }

    #[test]
    fn spearman_ignores_monotone_transform() {
        let x: Vec<f64> = (1..=40).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| v.powi(3)).collect();

        let result = correlate(CorrelationMethod::Spearman, &x, &y, 0.95, 30);
        assert!((result.effect_size.value - 1.0).abs() < 1e-9);
        assert!(result.p_value < 1e-6);
        assert_eq!(result.test_name, "spearman");
    }
}
