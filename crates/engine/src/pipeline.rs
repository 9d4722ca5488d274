//! The `evaluate` entry point.

use std::collections::BTreeMap;

use sentiment_impact_conditions::{Aggregator, Partitioner};
use sentiment_impact_core::{
    complete_labels, validate_inputs, EngineConfig, EngineError, Event, ImpactRecord,
    PriceSeries, SentimentLabel,
};
use sentiment_impact_data::Aligner;
use sentiment_impact_stats::{build_samples, Analyzer};
use sentiment_impact_validation::validate;
use tracing::info;

use crate::result::{AnalysisResult, Evaluation, SymbolResult};

/// Aligns, scores and analyzes one study.
///
/// The quality report sees the labels as supplied; partitioning and analysis
/// use them completed with keyword-fallback labels. Only malformed input or an
/// invalid configuration fails; data-quality and sample-size problems surface
/// as issues and flags in the output.
///
/// # Errors
///
/// Returns `InvalidConfig` or `InputMalformed`.
pub fn evaluate(
    events: &[Event],
    labels: &[SentimentLabel],
    series_by_symbol: &BTreeMap<String, PriceSeries>,
    config: &EngineConfig,
) -> Result<Evaluation, EngineError> {
    config.validate()?;
    validate_inputs(events, labels, series_by_symbol)?;

    let impact_records = Aligner::from_config(config).align(events, &config.symbols, series_by_symbol);
    let quality_report = validate(events, labels, &impact_records, config)?;

    let completed = complete_labels(events, labels);
    let partitioner = Partitioner::from_config(config)?;
    let aggregator = Aggregator::from_config(config);
    let analyzer = Analyzer::from_config(config);

    let mut by_symbol: BTreeMap<&str, Vec<ImpactRecord>> = BTreeMap::new();
    for record in &impact_records {
        by_symbol
            .entry(record.symbol.as_str())
            .or_default()
            .push(record.clone());
    }

    let mut analysis = AnalysisResult::default();
    for (symbol, records) in by_symbol {
        let partitions = partitioner.partition(events, &completed, &records);
        let aggregates = aggregator.aggregate(&partitions, events, &records);
        let samples = build_samples(events, &completed, &records, config);
        let symbol_analysis = analyzer.analyze(symbol, &samples, &partitions);

        analysis.symbols.insert(
            symbol.to_string(),
            SymbolResult {
                partitions,
                aggregates,
                analysis: symbol_analysis,
            },
        );
    }

    info!(
        "Evaluated {} events: quality {:?} ({:.1}), {} significant findings",
        events.len(),
        quality_report.status,
        quality_report.overall_score,
        analysis.significant_findings().count()
    );

    Ok(Evaluation {
        impact_records,
        quality_report,
        analysis,
    })
}
