//! Tail probabilities and quantiles from `statrs`.
//!
//! Invalid parameters (e.g. zero degrees of freedom) give a p-value of 1 rather
//! than an error: an untestable hypothesis is simply not rejected.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Two-tailed p-value of a Student-t statistic.
#[must_use]
pub fn t_two_tailed(t: f64, df: f64) -> f64 {
    if !t.is_finite() || !(df > 0.0) {
        return 1.0;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Quantile of the Student-t distribution.
#[must_use]
pub fn t_quantile(p: f64, df: f64) -> Option<f64> {
    StudentsT::new(0.0, 1.0, df)
        .ok()
        .map(|dist| dist.inverse_cdf(p))
        .filter(|q| q.is_finite())
}

/// Upper-tail p-value of an F statistic.
#[must_use]
pub fn f_upper_tail(f: f64, d1: f64, d2: f64) -> f64 {
    if !f.is_finite() {
        return if f > 0.0 { 0.0 } else { 1.0 };
    }
    match FisherSnedecor::new(d1, d2) {
        Ok(dist) => dist.sf(f.max(0.0)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Upper-tail p-value of a chi-squared statistic.
#[must_use]
pub fn chi2_upper_tail(x: f64, df: f64) -> f64 {
    if !x.is_finite() {
        return if x > 0.0 { 0.0 } else { 1.0 };
    }
    match ChiSquared::new(df) {
        Ok(dist) => dist.sf(x.max(0.0)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Two-tailed p-value of a standard normal statistic.
#[must_use]
pub fn normal_two_tailed(z: f64) -> f64 {
    if !z.is_finite() {
        return if z.is_nan() { 1.0 } else { 0.0 };
    }
    match Normal::new(0.0, 1.0) {
        Ok(dist) => (2.0 * dist.sf(z.abs())).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Standard normal quantile.
#[must_use]
pub fn normal_quantile(p: f64) -> Option<f64> {
    Normal::new(0.0, 1.0)
        .ok()
        .map(|dist| dist.inverse_cdf(p))
        .filter(|q| q.is_finite())
}
