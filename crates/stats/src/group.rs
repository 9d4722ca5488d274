//! Group-difference tests between condition buckets.
//!
//! Two buckets are compared with Welch's t-test. Three or more get a one-way
//! ANOVA followed by pairwise Welch tests. When any bucket fails the
//! Jarque-Bera normality check the rank-based tests replace them
//! (Kruskal-Wallis and Mann-Whitney U). Pairwise p-values are always
//! Bonferroni-corrected over the number of pairs.

use serde::{Deserialize, Serialize};
use sentiment_impact_core::Flag;

use crate::descriptive::{calculate_ranks, mean, sample_variance, tie_term};
use crate::distributions::{chi2_upper_tail, f_upper_tail, normal_two_tailed, t_quantile, t_two_tailed};
use crate::types::{correct_family, EffectSize, EffectSizeKind, StatisticalResult};

/// Smallest bucket the normality check is run on.
pub const MIN_NORMALITY_N: usize = 8;

// ============================================
// Two-sample tests
// ============================================

/// Summary statistics of one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupSummary {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
}

impl GroupSummary {
    #[must_use]
    pub fn new(n: usize, mean: f64, std_dev: f64) -> Self {
        Self { n, mean, std_dev }
    }

    /// `None` below two values.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            n: values.len(),
            mean: mean(values)?,
            std_dev: sample_variance(values)?.sqrt(),
        })
    }
}

/// Welch's unequal-variance t-test from summary statistics.
///
/// Effect size is Cohen's d over the average of the two variances; the interval
/// is for the difference in means `a - b`.
pub fn welch_from_summary(a: GroupSummary, b: GroupSummary, confidence_level: f64) -> StatisticalResult {
    let diff = a.mean - b.mean;
    let pooled_sd = ((a.std_dev.powi(2) + b.std_dev.powi(2)) / 2.0).sqrt();
    let cohens_d = if pooled_sd > f64::EPSILON { diff / pooled_sd } else { 0.0 };
    let effect = EffectSize::new(EffectSizeKind::CohensD, cohens_d);

    if a.n < 2 || b.n < 2 {
        let mut result = StatisticalResult::new("welch_t", 0.0, 1.0, effect, a.n + b.n);
        result.flag(Flag::InsufficientSample);
        result.warn("welch test needs at least two values per group");
        return result;
    }

    let va = a.std_dev.powi(2) / a.n as f64;
    let vb = b.std_dev.powi(2) / b.n as f64;
    let se = (va + vb).sqrt();

    if se < f64::EPSILON {
        let mut result = StatisticalResult::new("welch_t", 0.0, 1.0, effect, a.n + b.n);
        result.warn("both groups have zero variance");
        return result;
    }

    let t = diff / se;
    let df = (va + vb).powi(2)
        / (va.powi(2) / (a.n as f64 - 1.0) + vb.powi(2) / (b.n as f64 - 1.0));

    let mut result = StatisticalResult::new("welch_t", t, t_two_tailed(t, df), effect, a.n + b.n)
        .with_degrees_of_freedom(df);
    if let Some(crit) = t_quantile(1.0 - (1.0 - confidence_level) / 2.0, df) {
        result.confidence_interval = Some((diff - crit * se, diff + crit * se));
    }
    result
}

/// Welch's t-test over raw values.
pub fn welch_t_test(a: &[f64], b: &[f64], confidence_level: f64) -> StatisticalResult {
    match (GroupSummary::from_values(a), GroupSummary::from_values(b)) {
        (Some(sa), Some(sb)) => welch_from_summary(sa, sb, confidence_level),
        _ => {
            let mut result = StatisticalResult::new(
                "welch_t",
                0.0,
                1.0,
                EffectSize::new(EffectSizeKind::CohensD, 0.0),
                a.len() + b.len(),
            );
            result.flag(Flag::InsufficientSample);
            result.warn("welch test needs at least two values per group");
            result
        }
    }
}

/// Mann-Whitney U with the tie-corrected normal approximation and a continuity
/// correction. Effect size is the rank-biserial correlation, positive when `a`
/// tends to exceed `b`.
pub fn mann_whitney(a: &[f64], b: &[f64]) -> StatisticalResult {
    let (n1, n2) = (a.len(), b.len());
    let total = n1 + n2;

    if n1 == 0 || n2 == 0 {
        let mut result = StatisticalResult::new(
            "mann_whitney_u",
            0.0,
            1.0,
            EffectSize::new(EffectSizeKind::RankBiserial, 0.0),
            total,
        );
        result.flag(Flag::InsufficientSample);
        return result;
    }

    let combined: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    let ranks = calculate_ranks(&combined);
    let rank_sum_a: f64 = ranks[..n1].iter().sum();

    let (n1f, n2f, nf) = (n1 as f64, n2 as f64, total as f64);
    let u_a = rank_sum_a - n1f * (n1f + 1.0) / 2.0;
    let product = n1f * n2f;
    let rank_biserial = 2.0 * u_a / product - 1.0;

    let mu = product / 2.0;
    let tie_adjust = if total > 1 { tie_term(&combined) / (nf * (nf - 1.0)) } else { 0.0 };
    let sigma = (product / 12.0 * ((nf + 1.0) - tie_adjust)).sqrt();

    let p = if sigma > f64::EPSILON {
        let deviation = u_a - mu;
        normal_two_tailed((deviation.abs() - 0.5).max(0.0) / sigma)
    } else {
        1.0
    };

    StatisticalResult::new(
        "mann_whitney_u",
        u_a,
        p,
        EffectSize::new(EffectSizeKind::RankBiserial, rank_biserial),
        total,
    )
}

// ============================================
// Omnibus tests
// ============================================

fn non_empty<'a>(groups: &[&'a [f64]]) -> Vec<&'a [f64]> {
    groups.iter().copied().filter(|g| !g.is_empty()).collect()
}

/// One-way ANOVA; effect size is eta squared.
pub fn one_way_anova(groups: &[&[f64]]) -> StatisticalResult {
    let groups = non_empty(groups);
    let k = groups.len();
    let total: usize = groups.iter().map(|g| g.len()).sum();
    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / total.max(1) as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in &groups {
        let m = group.iter().sum::<f64>() / group.len() as f64;
        ss_between += group.len() as f64 * (m - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    }
    let ss_total = ss_between + ss_within;
    let eta_squared = if ss_total > f64::EPSILON { ss_between / ss_total } else { 0.0 };
    let effect = EffectSize::new(EffectSizeKind::EtaSquared, eta_squared);

    if k < 2 || total <= k {
        let mut result = StatisticalResult::new("anova_f", 0.0, 1.0, effect, total);
        result.flag(Flag::InsufficientSample);
        result.warn("anova needs two groups and more values than groups");
        return result;
    }

    let df_between = (k - 1) as f64;
    let df_within = (total - k) as f64;
    let (f, p) = if ss_within > f64::EPSILON {
        let f = (ss_between / df_between) / (ss_within / df_within);
        (f, f_upper_tail(f, df_between, df_within))
    } else if ss_between > f64::EPSILON {
        (f64::INFINITY, 0.0)
    } else {
        (0.0, 1.0)
    };

    StatisticalResult::new("anova_f", f, p, effect, total).with_degrees_of_freedom(df_between)
}

/// Kruskal-Wallis H with tie correction; effect size is epsilon squared `H / (N - 1)`.
pub fn kruskal_wallis(groups: &[&[f64]]) -> StatisticalResult {
    let groups = non_empty(groups);
    let k = groups.len();
    let combined: Vec<f64> = groups.iter().flat_map(|g| g.iter()).copied().collect();
    let total = combined.len();

    if k < 2 || total < 3 {
        let mut result = StatisticalResult::new(
            "kruskal_wallis_h",
            0.0,
            1.0,
            EffectSize::new(EffectSizeKind::EpsilonSquared, 0.0),
            total,
        );
        result.flag(Flag::InsufficientSample);
        return result;
    }

    let ranks = calculate_ranks(&combined);
    let nf = total as f64;
    let mut offset = 0;
    let mut rank_term = 0.0;
    for group in &groups {
        let sum: f64 = ranks[offset..offset + group.len()].iter().sum();
        rank_term += sum * sum / group.len() as f64;
        offset += group.len();
    }

    let mut h = 12.0 / (nf * (nf + 1.0)) * rank_term - 3.0 * (nf + 1.0);
    let correction = 1.0 - tie_term(&combined) / (nf.powi(3) - nf);
    if correction > f64::EPSILON {
        h /= correction;
    }
    let h = h.max(0.0);
    let df = (k - 1) as f64;

    StatisticalResult::new(
        "kruskal_wallis_h",
        h,
        chi2_upper_tail(h, df),
        EffectSize::new(EffectSizeKind::EpsilonSquared, h / (nf - 1.0)),
        total,
    )
    .with_degrees_of_freedom(df)
}

/// Jarque-Bera statistic and p-value; `None` below [`MIN_NORMALITY_N`] values
/// or for a constant group.
#[must_use]
pub fn jarque_bera(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < MIN_NORMALITY_N {
        return None;
    }
    let n = values.len() as f64;
    let m = mean(values)?;
    let moment = |k: i32| values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / n;
    let m2 = moment(2);
    if m2 < f64::EPSILON {
        return None;
    }
    let skew = moment(3) / m2.powf(1.5);
    let kurtosis = moment(4) / (m2 * m2);
    let jb = n / 6.0 * (skew * skew + (kurtosis - 3.0).powi(2) / 4.0);
    Some((jb, chi2_upper_tail(jb, 2.0)))
}

// ============================================
// Bucket comparison
// ============================================

/// Values of one bucket at one horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSample {
    pub label: String,
    pub values: Vec<f64>,
    /// Whether the bucket meets the minimum size for findings.
    pub eligible: bool,
}

impl GroupSample {
    pub fn new(label: impl Into<String>, values: Vec<f64>, eligible: bool) -> Self {
        Self {
            label: label.into(),
            values,
            eligible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityCheck {
    pub bucket_label: String,
    pub statistic: f64,
    pub p_value: f64,
    pub rejected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparison {
    pub bucket_a: String,
    pub bucket_b: String,
    pub n_a: usize,
    pub n_b: usize,
    pub eligible: bool,
    pub result: StatisticalResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupComparison {
    pub partition_name: String,
    pub horizon_hours: u32,
    /// ANOVA or Kruskal-Wallis across all buckets; absent for two buckets.
    pub omnibus: Option<StatisticalResult>,
    pub pairwise: Vec<PairwiseComparison>,
    pub normality: Vec<NormalityCheck>,
    pub normality_violated: bool,
}

impl GroupComparison {
    /// Pairs whose corrected p-value clears `alpha` and whose buckets are both eligible.
    pub fn significant_pairs(&self, alpha: f64) -> impl Iterator<Item = &PairwiseComparison> + '_ {
        self.pairwise
            .iter()
            .filter(move |p| p.eligible && p.result.is_significant(alpha))
    }
}

/// Compares the buckets of one partition at one horizon.
///
/// Buckets with fewer than two values cannot be tested and are skipped; `None`
/// when fewer than two buckets remain.
pub fn compare_buckets(
    partition_name: &str,
    horizon_hours: u32,
    groups: &[GroupSample],
    normality_alpha: f64,
    confidence_level: f64,
) -> Option<GroupComparison> {
    let testable: Vec<&GroupSample> = groups.iter().filter(|g| g.values.len() >= 2).collect();
    if testable.len() < 2 {
        return None;
    }

    let normality: Vec<NormalityCheck> = testable
        .iter()
        .filter_map(|g| {
            jarque_bera(&g.values).map(|(statistic, p_value)| NormalityCheck {
                bucket_label: g.label.clone(),
                statistic,
                p_value,
                rejected: p_value < normality_alpha,
            })
        })
        .collect();
    let normality_violated = normality.iter().any(|c| c.rejected);
    let violation_note = |result: &mut StatisticalResult| {
        if normality_violated {
            result.flag(Flag::StatisticalAssumptionViolated);
            result.warn("normality rejected for at least one bucket; rank-based test used");
        }
    };

    let omnibus = (testable.len() >= 3).then(|| {
        let slices: Vec<&[f64]> = testable.iter().map(|g| g.values.as_slice()).collect();
        let mut result = if normality_violated {
            kruskal_wallis(&slices)
        } else {
            one_way_anova(&slices)
        };
        violation_note(&mut result);
        result
    });

    let mut pairs = Vec::new();
    let mut results = Vec::new();
    for (i, a) in testable.iter().enumerate() {
        for b in &testable[i + 1..] {
            let mut result = if normality_violated {
                mann_whitney(&a.values, &b.values)
            } else {
                welch_t_test(&a.values, &b.values, confidence_level)
            };
            violation_note(&mut result);
            let eligible = a.eligible && b.eligible;
            if !eligible {
                result.flag(Flag::InsufficientSample);
            }
            pairs.push((a, b, eligible));
            results.push(result);
        }
    }
    correct_family(&mut results);

    let pairwise = pairs
        .into_iter()
        .zip(results)
        .map(|((a, b, eligible), result)| PairwiseComparison {
            bucket_a: a.label.clone(),
            bucket_b: b.label.clone(),
            n_a: a.values.len(),
            n_b: b.values.len(),
            eligible,
            result,
        })
        .collect();

    Some(GroupComparison {
        partition_name: partition_name.to_string(),
        horizon_hours,
        omnibus,
        pairwise,
        normality,
        normality_violated,
    })
}
