//! Read-only view of the inputs shared by every check.

use std::collections::{BTreeMap, BTreeSet};

use sentiment_impact_core::{EngineConfig, Event, ImpactRecord, QualityConfig, SentimentLabel};

use crate::types::QualitySummary;

/// Immutable inputs plus derived counts. Checks read from it and return their
/// own issues; nothing is accumulated here.
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    pub events: &'a [Event],
    pub labels: &'a [SentimentLabel],
    pub records: &'a [ImpactRecord],
    pub config: &'a EngineConfig,
    symbols: BTreeSet<&'a str>,
    usable_event_ids: BTreeSet<&'a str>,
    resolved_baselines: usize,
}

impl<'a> ValidationContext<'a> {
    #[must_use]
    pub fn new(
        events: &'a [Event],
        labels: &'a [SentimentLabel],
        records: &'a [ImpactRecord],
        config: &'a EngineConfig,
    ) -> Self {
        let symbols = config
            .symbols
            .iter()
            .map(String::as_str)
            .chain(records.iter().map(|r| r.symbol.as_str()))
            .collect();
        let usable_event_ids = records
            .iter()
            .filter(|r| r.any_resolved())
            .map(|r| r.event_id.as_str())
            .collect();
        let resolved_baselines = records.iter().filter(|r| r.has_baseline()).count();

        Self {
            events,
            labels,
            records,
            config,
            symbols,
            usable_event_ids,
            resolved_baselines,
        }
    }

    #[must_use]
    pub fn quality(&self) -> &QualityConfig {
        &self.config.quality
    }

    /// Symbols requested in config or present in the impact records.
    #[must_use]
    pub fn symbols(&self) -> &BTreeSet<&'a str> {
        &self.symbols
    }

    /// Distinct events with at least one resolved horizon for some symbol.
    #[must_use]
    pub fn usable_events(&self) -> usize {
        self.usable_event_ids.len()
    }

    #[must_use]
    pub fn resolved_baselines(&self) -> usize {
        self.resolved_baselines
    }

    /// Records grouped by symbol.
    #[must_use]
    pub fn records_by_symbol(&self) -> BTreeMap<&'a str, Vec<&'a ImpactRecord>> {
        let mut grouped: BTreeMap<&str, Vec<&ImpactRecord>> =
            self.symbols.iter().map(|s| (*s, Vec::new())).collect();
        for record in self.records {
            grouped.entry(record.symbol.as_str()).or_default().push(record);
        }
        grouped
    }

    #[must_use]
    pub fn summary(&self) -> QualitySummary {
        QualitySummary {
            events: self.events.len(),
            labels: self.labels.len(),
            impact_records: self.records.len(),
            resolved_baselines: self.resolved_baselines,
            usable_events: self.usable_events(),
        }
    }
}
