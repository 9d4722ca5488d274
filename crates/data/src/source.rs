//! Fetching price series for a run from a [`MarketDataSource`].

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use sentiment_impact_core::{Event, MarketDataSource, PriceSeries};

/// Window of bars needed to align `events` over horizons up to `max_horizon_hours`,
/// padded by `padding` on both sides.
#[must_use]
pub fn required_window(
    events: &[Event],
    max_horizon_hours: u32,
    padding: Duration,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = events.iter().map(|e| e.timestamp).min()?;
    let last = events.iter().map(|e| e.timestamp).max()?;
    Some((
        first - padding,
        last + Duration::hours(i64::from(max_horizon_hours)) + padding,
    ))
}

/// Loads one series per symbol from `source`.
///
/// Symbols the source cannot serve are logged and left out of the map. The
/// aligner then marks their records `MISSING` and the quality validator
/// reports them; one unavailable symbol never aborts the run.
pub fn collect_series(
    source: &dyn MarketDataSource,
    symbols: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> BTreeMap<String, PriceSeries> {
    let mut series_by_symbol = BTreeMap::new();

    for symbol in symbols {
        match source.bars(symbol, start, end) {
            Ok(series) => {
                tracing::info!("Loaded {} bars for {}", series.len(), symbol);
                series_by_symbol.insert(symbol.clone(), series);
            }
            Err(err) => {
                tracing::warn!("Skipping {}: {}", symbol, err);
            }
        }
    }

    series_by_symbol
}
