//! Robustness checks for the primary correlation and the regression.
//!
//! Bootstrap iterations are seeded per iteration (`seed`, stream = iteration
//! index), so the distribution does not depend on how rayon schedules the
//! chunks. Both the bootstrap and cross-validation honour a wall-clock budget
//! and report `PARTIAL` with the work actually completed.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sentiment_impact_core::{BootstrapConfig, Flag};
use tracing::{debug, warn};

use crate::correlation::CorrelationMethod;
use crate::descriptive::z_scores;
use crate::regression::{fit_ols, r_squared};
use crate::types::RunStatus;

/// Iterations per parallel chunk; the deadline is checked between chunks.
pub const BOOTSTRAP_CHUNK: usize = 500;

// ============================================
// Outliers
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSensitivity {
    pub z_threshold: f64,
    pub excluded_event_ids: Vec<String>,
    pub r_all: Option<f64>,
    pub r_trimmed: Option<f64>,
    /// `r_trimmed - r_all`.
    pub delta: Option<f64>,
    pub trimmed_sample_size: usize,
}

/// Recomputes the correlation without points whose price change has |z| above the threshold.
pub fn outlier_sensitivity(
    method: CorrelationMethod,
    ids: &[String],
    x: &[f64],
    y: &[f64],
    z_threshold: f64,
) -> OutlierSensitivity {
    let r_all = method.coefficient(x, y);
    let keep: Vec<bool> = match z_scores(y) {
        Some(z) => z.iter().map(|v| v.abs() <= z_threshold).collect(),
        None => vec![true; y.len()],
    };

    let mut excluded_event_ids = Vec::new();
    let mut x_kept = Vec::with_capacity(x.len());
    let mut y_kept = Vec::with_capacity(y.len());
    for (i, kept) in keep.iter().enumerate() {
        if *kept {
            x_kept.push(x[i]);
            y_kept.push(y[i]);
        } else if let Some(id) = ids.get(i) {
            excluded_event_ids.push(id.clone());
        }
    }

    let r_trimmed = method.coefficient(&x_kept, &y_kept);
    OutlierSensitivity {
        z_threshold,
        excluded_event_ids,
        r_all,
        r_trimmed,
        delta: r_all.zip(r_trimmed).map(|(a, t)| t - a),
        trimmed_sample_size: x_kept.len(),
    }
}

// ============================================
// Bootstrap
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub statistic: String,
    pub point_estimate: f64,
    /// Absent when no resample produced a value.
    pub confidence_interval: Option<(f64, f64)>,
    pub confidence_level: f64,
    /// Bootstrap standard error; absent with fewer than two resampled values.
    pub standard_error: Option<f64>,
    /// Estimated bias (mean of bootstrap - point estimate).
    pub bias: Option<f64>,
    pub iterations_requested: usize,
    pub iterations_completed: usize,
    /// Resamples on which the statistic was undefined (e.g. constant series).
    pub degenerate_resamples: usize,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Flag>,
}

impl BootstrapResult {
    /// Returns the width of the confidence interval.
    #[must_use]
    pub fn ci_width(&self) -> Option<f64> {
        self.confidence_interval.map(|(lo, hi)| hi - lo)
    }

    /// Returns true if zero is outside the confidence interval.
    #[must_use]
    pub fn excludes_zero(&self) -> bool {
        self.confidence_interval
            .is_some_and(|(lo, hi)| lo > 0.0 || hi < 0.0)
    }
}

/// Percentile interval over a sorted distribution; `None` when it is empty.
#[must_use]
pub fn percentile_ci(distribution: &[f64], confidence_level: f64) -> Option<(f64, f64)> {
    if distribution.is_empty() {
        return None;
    }
    if distribution.len() == 1 {
        return Some((distribution[0], distribution[0]));
    }

    let alpha = 1.0 - confidence_level;
    let n = distribution.len();

    let lower_idx = ((alpha / 2.0) * n as f64).floor() as usize;
    let upper_idx = ((1.0 - alpha / 2.0) * n as f64).ceil() as usize;

    let lower_idx = lower_idx.min(n - 1);
    let upper_idx = upper_idx.min(n - 1).max(lower_idx);

    Some((distribution[lower_idx], distribution[upper_idx]))
}

/// Paired bootstrap resampler for a correlation coefficient.
pub struct BootstrapResampler {
    config: BootstrapConfig,
}

impl BootstrapResampler {
    #[must_use]
    pub fn new(config: BootstrapConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    fn iteration_rng(&self, iteration: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        rng.set_stream(iteration as u64);
        rng
    }

    fn resample_once(&self, method: CorrelationMethod, x: &[f64], y: &[f64], iteration: usize) -> Option<f64> {
        let n = x.len();
        let mut rng = self.iteration_rng(iteration);
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for _ in 0..n {
            let i = rng.gen_range(0..n);
            xs.push(x[i]);
            ys.push(y[i]);
        }
        method.coefficient(&xs, &ys)
    }

    /// Bootstraps the correlation of `x` and `y`; `None` when the full-sample
    /// coefficient is undefined.
    pub fn bootstrap_correlation(
        &self,
        method: CorrelationMethod,
        x: &[f64],
        y: &[f64],
    ) -> Option<BootstrapResult> {
        let n = x.len().min(y.len());
        let (x, y) = (&x[..n], &y[..n]);
        let point_estimate = method.coefficient(x, y)?;

        let requested = self.config.iterations;
        let deadline = self
            .config
            .max_duration_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        let mut distribution: Vec<f64> = Vec::with_capacity(requested);
        let mut completed = 0;
        let mut degenerate = 0;
        while completed < requested {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(completed, requested, "Bootstrap budget exhausted");
                break;
            }
            let end = (completed + BOOTSTRAP_CHUNK).min(requested);
            let chunk: Vec<Option<f64>> = (completed..end)
                .into_par_iter()
                .map(|i| self.resample_once(method, x, y, i))
                .collect();
            degenerate += chunk.iter().filter(|v| v.is_none()).count();
            distribution.extend(chunk.into_iter().flatten());
            completed = end;
        }

        distribution.sort_by(f64::total_cmp);
        let confidence_interval = percentile_ci(&distribution, self.config.confidence_level);

        let mean = (!distribution.is_empty())
            .then(|| distribution.iter().sum::<f64>() / distribution.len() as f64);
        let bias = mean.map(|m| m - point_estimate);
        let standard_error = mean.filter(|_| distribution.len() >= 2).map(|m| {
            let variance = distribution.iter().map(|v| (v - m).powi(2)).sum::<f64>()
                / (distribution.len() - 1) as f64;
            variance.sqrt()
        });
        if distribution.is_empty() {
            warn!(completed, degenerate, "Bootstrap produced no usable resamples");
        }

        let status = if completed < requested {
            RunStatus::Partial
        } else {
            RunStatus::Complete
        };
        debug!(completed, degenerate, ?status, "Bootstrap finished");

        Some(BootstrapResult {
            statistic: method.as_str().to_string(),
            point_estimate,
            confidence_interval,
            confidence_level: self.config.confidence_level,
            standard_error,
            bias,
            iterations_requested: requested,
            iterations_completed: completed,
            degenerate_resamples: degenerate,
            status,
            flags: if status == RunStatus::Partial {
                vec![Flag::TimeoutPartial]
            } else {
                Vec::new()
            },
        })
    }
}

// ============================================
// Cross-validation
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    pub folds: usize,
    pub folds_completed: usize,
    /// Out-of-fold R² per completed fold.
    pub fold_r_squared: Vec<f64>,
    pub mean_r_squared: Option<f64>,
    pub std_r_squared: Option<f64>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Flag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// K-fold cross-validation of the OLS R².
///
/// Rows must already be in timestamp order; row `i` goes to fold `i % k`.
pub fn cross_validate(rows: &[Vec<f64>], y: &[f64], k: usize, budget: Option<Duration>) -> CrossValidationResult {
    let n = rows.len().min(y.len());
    let regressors = rows.first().map_or(0, Vec::len);
    let mut result = CrossValidationResult {
        folds: k,
        folds_completed: 0,
        fold_r_squared: Vec::new(),
        mean_r_squared: None,
        std_r_squared: None,
        status: RunStatus::Complete,
        flags: Vec::new(),
        warnings: Vec::new(),
    };

    // each training set must still hold more rows than coefficients
    if k < 2 || n < k * 2 || n - n.div_ceil(k) <= regressors + 1 {
        result.flags.push(Flag::InsufficientSample);
        result
            .warnings
            .push(format!("{} rows are too few for {}-fold cross-validation", n, k));
        return result;
    }

    let deadline = budget.map(|b| Instant::now() + b);
    for fold in 0..k {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            result.status = RunStatus::Partial;
            result.flags.push(Flag::TimeoutPartial);
            warn!(completed = result.folds_completed, k, "Cross-validation budget exhausted");
            break;
        }

        let (mut train_rows, mut train_y) = (Vec::new(), Vec::new());
        let (mut test_rows, mut test_y) = (Vec::new(), Vec::new());
        for i in 0..n {
            if i % k == fold {
                test_rows.push(&rows[i]);
                test_y.push(y[i]);
            } else {
                train_rows.push(rows[i].clone());
                train_y.push(y[i]);
            }
        }

        result.folds_completed += 1;
        match fit_ols(&train_rows, &train_y) {
            Some(fit) => {
                let predicted: Vec<f64> = test_rows.iter().map(|r| fit.predict(r)).collect();
                result.fold_r_squared.push(r_squared(&test_y, &predicted));
            }
            None => result
                .warnings
                .push(format!("fold {} training design matrix is singular", fold)),
        }
    }

    let scores = &result.fold_r_squared;
    if !scores.is_empty() {
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let variance = scores.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        result.mean_r_squared = Some(mean);
        result.std_r_squared = Some(variance.sqrt());
    }
    result
}
