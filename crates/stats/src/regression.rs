//! Ordinary least squares with an intercept, solved through the normal equations.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use sentiment_impact_core::Flag;

use crate::distributions::{f_upper_tail, t_quantile, t_two_tailed};
use crate::types::{EffectSize, EffectSizeKind};

pub const INTERCEPT: &str = "intercept";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_statistic: f64,
    pub p_value: f64,
    pub confidence_interval: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub dependent: String,
    /// Intercept first, then regressors in the order given. Empty when the fit failed.
    pub coefficients: Vec<Coefficient>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    /// p-value of the overall F test.
    pub p_value: f64,
    pub sample_size: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Flag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RegressionResult {
    fn failed(dependent: &str, n: usize, flag: Flag, warning: impl Into<String>) -> Self {
        Self {
            dependent: dependent.to_string(),
            coefficients: Vec::new(),
            r_squared: 0.0,
            adj_r_squared: 0.0,
            f_statistic: 0.0,
            p_value: 1.0,
            sample_size: n,
            flags: vec![flag],
            warnings: vec![warning.into()],
        }
    }

    #[must_use]
    pub fn effect_size(&self) -> EffectSize {
        EffectSize::new(EffectSizeKind::RSquared, self.r_squared)
    }

    #[must_use]
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Fitted coefficients, usable for out-of-sample prediction.
#[derive(Debug, Clone)]
pub struct OlsFit {
    beta: DVector<f64>,
    xtx_inv: DMatrix<f64>,
    residuals: DVector<f64>,
}

impl OlsFit {
    /// Predicted value for one row of regressors (without the intercept column).
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.beta[0]
            + row
                .iter()
                .zip(self.beta.iter().skip(1))
                .map(|(x, b)| x * b)
                .sum::<f64>()
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        self.beta.as_slice()
    }
}

fn design_matrix(rows: &[Vec<f64>], k: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), k + 1, |i, j| if j == 0 { 1.0 } else { rows[i][j - 1] })
}

/// Fits `y = b0 + b1*x1 + ...`; `None` when the design matrix is singular.
#[must_use]
pub fn fit_ols(rows: &[Vec<f64>], y: &[f64]) -> Option<OlsFit> {
    let n = rows.len();
    if n == 0 || n != y.len() {
        return None;
    }
    let k = rows[0].len();
    if rows.iter().any(|r| r.len() != k) {
        return None;
    }

    let x_matrix = design_matrix(rows, k);
    let y_vec = DVector::from_column_slice(y);

    let xtx = x_matrix.transpose() * &x_matrix;
    let xty = x_matrix.transpose() * &y_vec;

    let xtx_inv = xtx.try_inverse()?;
    if xtx_inv.iter().any(|v| !v.is_finite()) || (0..=k).any(|j| xtx_inv[(j, j)] <= 0.0) {
        return None;
    }
    let beta = &xtx_inv * xty;
    let residuals = &y_vec - &x_matrix * &beta;

    Some(OlsFit {
        beta,
        xtx_inv,
        residuals,
    })
}

/// Coefficient of determination of `predicted` against `actual`.
#[must_use]
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_total: f64 = actual[..n].iter().map(|y| (y - mean).powi(2)).sum();
    let ss_residual: f64 = actual[..n]
        .iter()
        .zip(&predicted[..n])
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    if ss_total < f64::EPSILON {
        return 0.0;
    }
    1.0 - ss_residual / ss_total
}

fn has_constant_column(rows: &[Vec<f64>], k: usize) -> Option<usize> {
    (0..k).find(|&j| {
        let first = rows[0][j];
        rows.iter().all(|r| (r[j] - first).abs() < f64::EPSILON)
    })
}

/// Full OLS report for `y` on the named regressors.
pub fn ols(
    dependent: &str,
    names: &[&str],
    rows: &[Vec<f64>],
    y: &[f64],
    confidence_level: f64,
) -> RegressionResult {
    let n = rows.len().min(y.len());
    let k = names.len();

    if n <= k + 1 {
        return RegressionResult::failed(
            dependent,
            n,
            Flag::InsufficientSample,
            format!("{} observations cannot fit {} coefficients", n, k + 1),
        );
    }
    if let Some(j) = has_constant_column(&rows[..n], k) {
        return RegressionResult::failed(
            dependent,
            n,
            Flag::StatisticalAssumptionViolated,
            format!("regressor {} is constant; design matrix is singular", names[j]),
        );
    }
    let Some(fit) = fit_ols(&rows[..n], &y[..n]) else {
        return RegressionResult::failed(
            dependent,
            n,
            Flag::StatisticalAssumptionViolated,
            "design matrix is singular",
        );
    };

    let y = &y[..n];
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let ss_total: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
    let ss_residual: f64 = fit.residuals.iter().map(|e| e * e).sum();

    let residual_df = (n - k - 1) as f64;
    let sigma2 = ss_residual / residual_df;
    let (r2, adj_r2) = if ss_total > f64::EPSILON {
        let r2 = 1.0 - ss_residual / ss_total;
        (r2, 1.0 - (1.0 - r2) * (n as f64 - 1.0) / residual_df)
    } else {
        (0.0, 0.0)
    };

    let f_statistic = if k > 0 && r2 < 1.0 {
        (r2 / k as f64) / ((1.0 - r2) / residual_df)
    } else if r2 >= 1.0 {
        f64::INFINITY
    } else {
        0.0
    };
    let crit = t_quantile(1.0 - (1.0 - confidence_level) / 2.0, residual_df);

    let coefficients = std::iter::once(INTERCEPT)
        .chain(names.iter().copied())
        .enumerate()
        .map(|(j, name)| {
            let estimate = fit.beta[j];
            let std_error = (sigma2 * fit.xtx_inv[(j, j)]).sqrt();
            let t_statistic = if std_error > f64::EPSILON { estimate / std_error } else { 0.0 };
            Coefficient {
                name: name.to_string(),
                estimate,
                std_error,
                t_statistic,
                p_value: if std_error > f64::EPSILON {
                    t_two_tailed(t_statistic, residual_df)
                } else {
                    1.0
                },
                confidence_interval: crit.map(|c| (estimate - c * std_error, estimate + c * std_error)),
            }
        })
        .collect();

    RegressionResult {
        dependent: dependent.to_string(),
        coefficients,
        r_squared: r2,
        adj_r_squared: adj_r2,
        f_statistic,
        p_value: f_upper_tail(f_statistic, k as f64, residual_df),
        sample_size: n,
        flags: Vec::new(),
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(x: &[f64]) -> Vec<Vec<f64>> {
        x.iter().map(|v| vec![*v]).collect()
    }

    #[test]
    fn recovers_exact_line() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 + 3.0 * v).collect();

        let fit = fit_ols(&rows(&x), &y).unwrap();
        assert!((fit.coefficients()[0] - 2.0).abs() < 1e-9);
        assert!((fit.coefficients()[1] - 3.0).abs() < 1e-9);
        assert!((fit.predict(&[20.0]) - 62.0).abs() < 1e-8);
    }

    #[test]
    fn reports_standard_errors() {
        // y = 1 + 2x + alternating noise
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| 1.0 + 2.0 * v + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();

        let result = ols("pct_change_24h", &["x"], &rows(&x), &y, 0.95);
        assert_eq!(result.coefficients.len(), 2);
        assert_eq!(result.coefficients[0].name, INTERCEPT);

        let slope = result.coefficient("x").unwrap();
        assert!((slope.estimate - 2.0).abs() < 0.05, "slope was {}", slope.estimate);
        assert!(slope.std_error > 0.0);
        assert!(slope.p_value < 1e-10);
        let (lo, hi) = slope.confidence_interval.unwrap();
        assert!(lo < slope.estimate && slope.estimate < hi);
        assert!(result.r_squared > 0.99);
        assert!(result.adj_r_squared <= result.r_squared);
        assert_eq!(result.effect_size().kind, EffectSizeKind::RSquared);
    }

    #[test]
    fn constant_regressor_is_singular() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i), 1.0]).collect();
        let y: Vec<f64> = (0..10).map(f64::from).collect();

        let result = ols("y", &["x", "market_hours"], &rows, &y, 0.95);
        assert!(result.coefficients.is_empty());
        assert!(result.has_flag(Flag::StatisticalAssumptionViolated));
    }

    #[test]
    fn collinear_regressors_are_singular() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i), 2.0 * f64::from(i)]).collect();
        let y: Vec<f64> = (0..10).map(|i| f64::from(i % 3)).collect();
        assert!(fit_ols(&rows, &y).is_none());
    }

    #[test]
    fn too_few_rows_is_insufficient() {
        let result = ols("y", &["a", "b"], &[vec![1.0, 2.0], vec![2.0, 1.0]], &[1.0, 2.0], 0.95);
        assert!(result.coefficients.is_empty());
        assert!(result.has_flag(Flag::InsufficientSample));
    }

    #[test]
    fn r_squared_of_mean_prediction_is_zero() {
        let actual = [1.0, 2.0, 3.0];
        assert!(r_squared(&actual, &[2.0, 2.0, 2.0]).abs() < 1e-12);
        assert!((r_squared(&actual, &actual) - 1.0).abs() < 1e-12);
    }
}
