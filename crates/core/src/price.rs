use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, MarketDataError};

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl PriceBar {
    /// Bar with every price set to `close`; convenient for fixtures.
    #[must_use]
    pub fn flat(timestamp: DateTime<Utc>, close: Decimal) -> Self {
        Self {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: Decimal::ZERO,
        }
    }
}

/// Timestamp-ordered bars for one symbol. Gaps are legal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Builds a series, sorting bars by timestamp and dropping exact timestamp duplicates
    /// (the first occurrence is kept).
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    #[must_use]
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Latest bar with `timestamp <= at`.
    #[must_use]
    pub fn latest_at_or_before(&self, at: DateTime<Utc>) -> Option<&PriceBar> {
        let idx = self.bars.partition_point(|b| b.timestamp <= at);
        idx.checked_sub(1).map(|i| &self.bars[i])
    }

    /// Earliest bar with `timestamp >= at`.
    #[must_use]
    pub fn first_at_or_after(&self, at: DateTime<Utc>) -> Option<&PriceBar> {
        let idx = self.bars.partition_point(|b| b.timestamp < at);
        self.bars.get(idx)
    }

    /// Bar closest to `at` within `tolerance`; on equal distance the earlier bar wins.
    #[must_use]
    pub fn nearest_within(&self, at: DateTime<Utc>, tolerance: Duration) -> Option<&PriceBar> {
        let before = self
            .latest_at_or_before(at)
            .filter(|b| at - b.timestamp <= tolerance);
        let after = self
            .first_at_or_after(at)
            .filter(|b| b.timestamp - at <= tolerance);

        match (before, after) {
            (Some(b), Some(a)) => {
                if a.timestamp - at < at - b.timestamp {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (b, a) => b.or(a),
        }
    }

    /// Checks structural validity: positive finite prices.
    ///
    /// # Errors
    ///
    /// Returns `InputMalformed` when a bar carries a non-positive close.
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(bar) = self.bars.iter().find(|b| b.close <= Decimal::ZERO) {
            return Err(EngineError::malformed(format!(
                "series {}: non-positive close {} at {}",
                self.symbol, bar.close, bar.timestamp
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    #[must_use]
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }
}

/// Market data collaborator: returns ordered OHLCV bars for a symbol and range.
pub trait MarketDataSource: Send + Sync {
    /// Fetches bars in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `MarketDataError` when data cannot be obtained or parsed.
    fn bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries, MarketDataError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    fn series() -> PriceSeries {
        PriceSeries::new(
            "TSLA",
            vec![
                PriceBar::flat(at(15, 0), dec!(200)),
                PriceBar::flat(at(14, 30), dec!(199)),
                PriceBar::flat(at(15, 10), dec!(201)),
            ],
        )
    }

    #[test]
    fn new_sorts_bars() {
        let s = series();
        let times: Vec<_> = s.bars().iter().map(|b| b.timestamp).collect();
        assert_eq!(times, vec![at(14, 30), at(15, 0), at(15, 10)]);
    }

    #[test]
    fn new_drops_duplicate_timestamps() {
        let s = PriceSeries::new(
            "TSLA",
            vec![PriceBar::flat(at(15, 0), dec!(1)), PriceBar::flat(at(15, 0), dec!(2))],
        );
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn latest_at_or_before_includes_exact_match() {
        let s = series();
        assert_eq!(s.latest_at_or_before(at(15, 0)).unwrap().close, dec!(200));
        assert_eq!(s.latest_at_or_before(at(15, 4)).unwrap().close, dec!(200));
        assert!(s.latest_at_or_before(at(14, 0)).is_none());
    }

    #[test]
    fn first_at_or_after_includes_exact_match() {
        let s = series();
        assert_eq!(s.first_at_or_after(at(15, 0)).unwrap().close, dec!(200));
        assert_eq!(s.first_at_or_after(at(15, 1)).unwrap().close, dec!(201));
        assert!(s.first_at_or_after(at(16, 0)).is_none());
    }

    #[test]
    fn nearest_within_respects_tolerance() {
        let s = series();
        let tol = Duration::minutes(5);
        assert_eq!(s.nearest_within(at(15, 8), tol).unwrap().close, dec!(201));
        assert_eq!(s.nearest_within(at(15, 2), tol).unwrap().close, dec!(200));
        assert!(s.nearest_within(at(14, 45), tol).is_none());
    }

    #[test]
    fn nearest_within_tie_prefers_earlier() {
        let s = series();
        let tol = Duration::minutes(5);
        assert_eq!(s.nearest_within(at(15, 5), tol).unwrap().close, dec!(200));
    }

    #[test]
    fn validate_rejects_non_positive_close() {
        let s = PriceSeries::new("X", vec![PriceBar::flat(at(15, 0), dec!(0))]);
        assert!(s.validate().is_err());
        assert!(series().validate().is_ok());
    }
}
