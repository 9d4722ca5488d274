//! Event to price-series alignment.
//!
//! Each (event, symbol) pair gets a baseline price (latest bar at or before
//! the event, within tolerance) and one outcome per configured horizon.
//! Alignment is a pure function of its inputs: output order and values do
//! not depend on input order or on how symbols are spread across threads.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use sentiment_impact_core::{
    AlignmentConfig, EngineConfig, Event, HorizonResult, ImpactRecord, MarketCalendar,
    OffHoursPolicy, PriceBar, PriceSeries,
};

/// Aligns events with price series.
#[derive(Debug, Clone)]
pub struct Aligner {
    config: AlignmentConfig,
    calendar: MarketCalendar,
}

impl Aligner {
    #[must_use]
    pub fn new(config: AlignmentConfig, calendar: MarketCalendar) -> Self {
        Self { config, calendar }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.alignment.clone(), config.calendar.clone())
    }

    #[must_use]
    pub fn horizons(&self) -> &[u32] {
        &self.config.horizons_hours
    }

    /// Aligns every event against every symbol.
    ///
    /// `symbols` lists symbols that must appear even without a series; symbols
    /// present in `series_by_symbol` are always included. Records come back
    /// ordered by symbol, then event timestamp, then event id.
    pub fn align(
        &self,
        events: &[Event],
        symbols: &[String],
        series_by_symbol: &BTreeMap<String, PriceSeries>,
    ) -> Vec<ImpactRecord> {
        let all_symbols: BTreeSet<&str> = symbols
            .iter()
            .map(String::as_str)
            .chain(series_by_symbol.keys().map(String::as_str))
            .collect();
        let all_symbols: Vec<&str> = all_symbols.into_iter().collect();

        let mut ordered: Vec<&Event> = events.iter().collect();
        ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        let records: Vec<ImpactRecord> = all_symbols
            .par_iter()
            .flat_map_iter(|symbol| {
                let series = series_by_symbol.get(*symbol);
                if series.map_or(true, PriceSeries::is_empty) {
                    tracing::warn!("No price bars for {}; all horizons will be MISSING", symbol);
                }
                ordered
                    .iter()
                    .map(move |event| self.align_event(event, symbol, series))
            })
            .collect();

        let with_baseline = records.iter().filter(|r| r.has_baseline()).count();
        tracing::info!(
            "Aligned {} events against {} symbols: {} records, {} with baseline",
            events.len(),
            all_symbols.len(),
            records.len(),
            with_baseline
        );

        records
    }

    /// Aligns one event against one (possibly absent) series.
    #[must_use]
    pub fn align_event(
        &self,
        event: &Event,
        symbol: &str,
        series: Option<&PriceSeries>,
    ) -> ImpactRecord {
        let horizons = self.horizons();
        let Some(series) = series else {
            return ImpactRecord::unresolved(event.id.clone(), symbol, horizons);
        };

        let Some(baseline) = self.baseline(series, event.timestamp) else {
            tracing::debug!(
                "No baseline bar within {}m before {} for {}",
                self.config.tolerance_minutes,
                event.id,
                symbol
            );
            return ImpactRecord::unresolved(event.id.clone(), symbol, horizons);
        };

        let horizon_results = horizons
            .iter()
            .map(|h| {
                let target = event.timestamp + chrono::Duration::hours(i64::from(*h));
                (*h, self.resolve_horizon(series, baseline.close, target))
            })
            .collect();

        ImpactRecord {
            event_id: event.id.clone(),
            symbol: symbol.to_string(),
            baseline_price: Some(baseline.close),
            baseline_timestamp: Some(baseline.timestamp),
            horizon_results,
        }
    }

    /// Latest bar at or before `at`, if it lies within tolerance and carries a usable price.
    fn baseline<'a>(&self, series: &'a PriceSeries, at: DateTime<Utc>) -> Option<&'a PriceBar> {
        series
            .latest_at_or_before(at)
            .filter(|bar| at - bar.timestamp <= self.config.tolerance())
            .filter(|bar| !bar.close.is_zero())
    }

    fn resolve_horizon(
        &self,
        series: &PriceSeries,
        baseline_price: Decimal,
        target: DateTime<Utc>,
    ) -> HorizonResult {
        if self.calendar.is_market_open(target) {
            return series
                .nearest_within(target, self.config.tolerance())
                .and_then(|bar| {
                    pct_change(baseline_price, bar.close, self.config.precision_dp)
                        .map(|pct| HorizonResult::ok(pct, bar.timestamp))
                })
                .unwrap_or_else(HorizonResult::missing);
        }

        match self.config.off_hours_policy {
            OffHoursPolicy::MarkMissing => HorizonResult::missing(),
            OffHoursPolicy::ForwardFill => self
                .calendar
                .next_open(target)
                .and_then(|open| series.first_at_or_after(open))
                .filter(|bar| bar.timestamp - target <= self.config.max_forward_fill())
                .and_then(|bar| {
                    pct_change(baseline_price, bar.close, self.config.precision_dp)
                        .map(|pct| HorizonResult::adjusted(pct, bar.timestamp))
                })
                .unwrap_or_else(HorizonResult::missing),
        }
    }
}

/// Percent change from `baseline` to `price`, rounded half away from zero to `dp` places.
///
/// Returns `None` for a zero baseline or on arithmetic overflow.
#[must_use]
pub fn pct_change(baseline: Decimal, price: Decimal, dp: u32) -> Option<Decimal> {
    if baseline.is_zero() {
        return None;
    }
    price
        .checked_sub(baseline)?
        .checked_div(baseline)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|pct| pct.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
}
