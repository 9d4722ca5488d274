//! Structured artifacts handed to report renderers.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sentiment_impact_conditions::{BucketStats, Partitions};
use sentiment_impact_core::ImpactRecord;
use sentiment_impact_stats::{Finding, SymbolAnalysis};
use sentiment_impact_validation::QualityReport;

/// Everything computed for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolResult {
    pub partitions: Partitions,
    /// Per-bucket, per-horizon descriptive statistics.
    pub aggregates: Vec<BucketStats>,
    pub analysis: SymbolAnalysis,
}

/// Analysis keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbols: BTreeMap<String, SymbolResult>,
}

impl AnalysisResult {
    #[must_use]
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolResult> {
        self.symbols.get(symbol)
    }

    /// Significant findings across all symbols, paired with their symbol.
    pub fn significant_findings(&self) -> impl Iterator<Item = (&str, &Finding)> {
        self.symbols.iter().flat_map(|(symbol, result)| {
            result
                .analysis
                .significant_findings
                .iter()
                .map(move |f| (symbol.as_str(), f))
        })
    }

    /// Converts the result to pretty-printed JSON.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Converts the result to a human-readable text format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str("=== Impact Analysis ===\n");

        for (symbol, result) in &self.symbols {
            let analysis = &result.analysis;
            output.push_str(&format!("\n--- {} ({} samples) ---\n", symbol, analysis.sample_size));

            for c in &analysis.correlations {
                let r = &c.result;
                let ci = r
                    .confidence_interval
                    .map(|(lo, hi)| format!("[{:.3}, {:.3}]", lo, hi))
                    .unwrap_or_else(|| "n/a".to_string());
                output.push_str(&format!(
                    "{:<9} {:>3}h  r={:>7.3} {}  p={:.4} (corrected {:.4})  n={}{}\n",
                    c.method.as_str(),
                    c.horizon_hours,
                    r.effect_size.value,
                    ci,
                    r.p_value,
                    r.decision_p_value(),
                    r.sample_size,
                    if r.flags.is_empty() {
                        String::new()
                    } else {
                        format!("  {:?}", r.flags)
                    }
                ));
            }

            let regression = &analysis.regression;
            if regression.coefficients.is_empty() {
                output.push_str(&format!("Regression: not fitted {:?}\n", regression.flags));
            } else {
                output.push_str(&format!(
                    "Regression ({}): R²={:.3}  adj R²={:.3}  n={}\n",
                    regression.dependent, regression.r_squared, regression.adj_r_squared, regression.sample_size
                ));
                for coef in &regression.coefficients {
                    output.push_str(&format!(
                        "  {:<22} {:>9.4}  se={:.4}  t={:>7.3}  p={:.4}\n",
                        coef.name, coef.estimate, coef.std_error, coef.t_statistic, coef.p_value
                    ));
                }
            }

            if let Some(bootstrap) = &analysis.robustness.bootstrap {
                let ci = bootstrap
                    .confidence_interval
                    .map(|(lo, hi)| format!("[{:.3}, {:.3}]", lo, hi))
                    .unwrap_or_else(|| "n/a".to_string());
                output.push_str(&format!(
                    "Bootstrap {}: {} ({}/{} iterations, {:?})\n",
                    bootstrap.statistic,
                    ci,
                    bootstrap.iterations_completed,
                    bootstrap.iterations_requested,
                    bootstrap.status
                ));
            }
            if let Some(mean) = analysis.robustness.cross_validation.mean_r_squared {
                output.push_str(&format!(
                    "Cross-validated R²: {:.3} over {} folds\n",
                    mean, analysis.robustness.cross_validation.folds_completed
                ));
            }

            if analysis.significant_findings.is_empty() {
                output.push_str("No significant findings\n");
            } else {
                output.push_str("Significant findings:\n");
                for finding in &analysis.significant_findings {
                    output.push_str(&format!(
                        "  {}  ({:?} {:.3}, corrected p={:.4})\n",
                        finding.description,
                        finding.effect_size.kind,
                        finding.effect_size.value,
                        finding.corrected_p_value.unwrap_or(finding.p_value)
                    ));
                }
            }
        }

        output
    }
}

/// Output of [`evaluate`](crate::evaluate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub impact_records: Vec<ImpactRecord>,
    pub quality_report: QualityReport,
    pub analysis: AnalysisResult,
}

impl Evaluation {
    /// Converts the evaluation to pretty-printed JSON.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
