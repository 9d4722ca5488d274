//! Statistical analysis of sentiment against price impact: correlation,
//! bucket comparisons, regression and robustness checks.

pub mod analyzer;
pub mod correlation;
pub mod descriptive;
pub mod distributions;
pub mod group;
pub mod regression;
pub mod robustness;
pub mod types;

pub use analyzer::{
    build_samples, Analyzer, CorrelationResult, Finding, FindingKind, Robustness, Sample,
    SymbolAnalysis, REGRESSORS,
};
pub use correlation::{correlate, correlation_p_value, fisher_interval, CorrelationMethod};
pub use group::{
    compare_buckets, jarque_bera, kruskal_wallis, mann_whitney, one_way_anova,
    welch_from_summary, welch_t_test, GroupComparison, GroupSample, GroupSummary,
    NormalityCheck, PairwiseComparison,
};
pub use regression::{fit_ols, ols, Coefficient, OlsFit, RegressionResult};
pub use robustness::{
    cross_validate, outlier_sensitivity, percentile_ci, BootstrapResampler, BootstrapResult,
    CrossValidationResult, OutlierSensitivity,
};
pub use types::{
    bonferroni, bonferroni_alpha, correct_family, EffectSize, EffectSizeKind, RunStatus,
    StatisticalResult,
};
