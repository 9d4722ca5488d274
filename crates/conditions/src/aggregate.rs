//! Per-bucket, per-horizon descriptive statistics.
//!
//! Effective N is counted per horizon: a `MISSING` horizon drops out of that
//! horizon's denominator and is never treated as a zero change. Values are
//! reduced in a canonical order so results do not depend on thread scheduling.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sentiment_impact_core::{EngineConfig, Event, ImpactRecord};

use crate::partition::{ConditionBucket, Partitions};

/// A literal example event with its change at one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub event_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonStats {
    pub horizon_hours: u32,
    /// Events with an `OK` or `ADJUSTED` value at this horizon.
    pub n: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Population standard deviation.
    pub std_dev: Option<f64>,
    pub pct_positive: Option<f64>,
    pub best: Option<Example>,
    pub worst: Option<Example>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub partition_name: String,
    pub bucket_label: String,
    pub total_events: usize,
    /// `total_events >= min_bucket_size`; only eligible buckets may back a finding.
    pub eligible: bool,
    pub horizons: BTreeMap<u32, HorizonStats>,
}

impl BucketStats {
    #[must_use]
    pub fn horizon(&self, hours: u32) -> Option<&HorizonStats> {
        self.horizons.get(&hours)
    }
}

/// One observed value, carrying what the tie-break rules need.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Resolved values of `event_ids` at `horizon`, in canonical order (value, then event id).
///
/// Events without a record, or whose horizon is `MISSING`, are skipped.
#[must_use]
pub fn bucket_values<'a>(
    event_ids: impl IntoIterator<Item = &'a String>,
    record_by_id: &HashMap<&str, &ImpactRecord>,
    timestamp_by_id: &HashMap<&str, DateTime<Utc>>,
    horizon: u32,
) -> Vec<Observation> {
    let mut values: Vec<Observation> = event_ids
        .into_iter()
        .filter_map(|id| {
            let record = record_by_id.get(id.as_str())?;
            let value = record.horizon(horizon)?.effective_change_f64()?;
            let timestamp = timestamp_by_id.get(id.as_str()).copied()?;
            Some(Observation {
                event_id: id.clone(),
                timestamp,
                value,
            })
        })
        .collect();
    values.sort_by(canonical_order);
    values
}

fn canonical_order(a: &Observation, b: &Observation) -> Ordering {
    a.value
        .total_cmp(&b.value)
        .then_with(|| a.event_id.cmp(&b.event_id))
}

/// Earlier timestamp, then lower id, wins a tie.
fn tie_break(a: &Observation, b: &Observation) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.event_id.cmp(&b.event_id))
}

/// Descriptive statistics over values already in canonical order.
#[must_use]
pub fn describe(horizon_hours: u32, values: &[Observation]) -> HorizonStats {
    let n = values.len();
    if n == 0 {
        return HorizonStats {
            horizon_hours,
            n,
            mean: None,
            median: None,
            std_dev: None,
            pct_positive: None,
            best: None,
            worst: None,
        };
    }

    let count = n as f64;
    let mean = values.iter().map(|o| o.value).sum::<f64>() / count;
    let variance = values.iter().map(|o| (o.value - mean).powi(2)).sum::<f64>() / count;
    let median = if n % 2 == 0 {
        (values[n / 2 - 1].value + values[n / 2].value) / 2.0
    } else {
        values[n / 2].value
    };
    let positive = values.iter().filter(|o| o.value > 0.0).count();

    let best = values
        .iter()
        .min_by(|a, b| b.value.total_cmp(&a.value).then_with(|| tie_break(a, b)))
        .map(|o| Example {
            event_id: o.event_id.clone(),
            value: o.value,
        });
    let worst = values
        .iter()
        .min_by(|a, b| a.value.total_cmp(&b.value).then_with(|| tie_break(a, b)))
        .map(|o| Example {
            event_id: o.event_id.clone(),
            value: o.value,
        });

    HorizonStats {
        horizon_hours,
        n,
        mean: Some(mean),
        median: Some(median),
        std_dev: Some(variance.sqrt()),
        pct_positive: Some(positive as f64 / count * 100.0),
        best,
        worst,
    }
}

/// Computes [`BucketStats`] for every bucket of a partitioning.
#[derive(Debug, Clone)]
pub struct Aggregator {
    horizons: Vec<u32>,
    min_bucket_size: usize,
}

impl Aggregator {
    #[must_use]
    pub fn new(horizons: Vec<u32>, min_bucket_size: usize) -> Self {
        Self {
            horizons,
            min_bucket_size,
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.alignment.horizons_hours.clone(),
            config.partition.min_bucket_size,
        )
    }

    #[must_use]
    pub fn min_bucket_size(&self) -> usize {
        self.min_bucket_size
    }

    /// Aggregates every bucket against `records` (one symbol's impact records).
    ///
    /// Output is ordered by partition name, then bucket label.
    #[must_use]
    pub fn aggregate(
        &self,
        partitions: &Partitions,
        events: &[Event],
        records: &[ImpactRecord],
    ) -> Vec<BucketStats> {
        let record_by_id = index_records(records);
        let timestamp_by_id = index_timestamps(events);

        let buckets = partitions.to_buckets();
        let stats: Vec<BucketStats> = buckets
            .par_iter()
            .map(|bucket| self.bucket_stats(bucket, &record_by_id, &timestamp_by_id))
            .collect();

        tracing::debug!(
            "Aggregated {} buckets ({} eligible)",
            stats.len(),
            stats.iter().filter(|s| s.eligible).count()
        );
        stats
    }

    #[must_use]
    pub fn bucket_stats(
        &self,
        bucket: &ConditionBucket,
        record_by_id: &HashMap<&str, &ImpactRecord>,
        timestamp_by_id: &HashMap<&str, DateTime<Utc>>,
    ) -> BucketStats {
        let horizons = self
            .horizons
            .iter()
            .map(|h| {
                let values = bucket_values(&bucket.event_ids, record_by_id, timestamp_by_id, *h);
                (*h, describe(*h, &values))
            })
            .collect();

        BucketStats {
            partition_name: bucket.partition_name.clone(),
            bucket_label: bucket.bucket_label.clone(),
            total_events: bucket.len(),
            eligible: bucket.len() >= self.min_bucket_size,
            horizons,
        }
    }
}

/// First record per event id.
#[must_use]
pub fn index_records(records: &[ImpactRecord]) -> HashMap<&str, &ImpactRecord> {
    let mut by_id = HashMap::with_capacity(records.len());
    for record in records {
        by_id.entry(record.event_id.as_str()).or_insert(record);
    }
    by_id
}

/// First timestamp per event id.
#[must_use]
pub fn index_timestamps(events: &[Event]) -> HashMap<&str, DateTime<Utc>> {
    let mut by_id = HashMap::with_capacity(events.len());
    for event in events {
        by_id.entry(event.id.as_str()).or_insert(event.timestamp);
    }
    by_id
}
