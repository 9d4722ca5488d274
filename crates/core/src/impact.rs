//! Aligned price-impact outcomes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Resolution status of one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HorizonStatus {
    /// Price resolved at the target time.
    Ok,
    /// Target fell outside market hours; price forward-filled to the next trading bar.
    Adjusted,
    /// No price could be resolved.
    Missing,
}

/// Outcome at one horizon.
///
/// `pct_change` is populated if and only if the status is `Ok`. A
/// forward-filled value is kept apart in `adjusted_pct_change` together with
/// the timestamp of the bar it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonResult {
    pub pct_change: Option<Decimal>,
    pub status: HorizonStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_pct_change: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl HorizonResult {
    #[must_use]
    pub fn ok(pct_change: Decimal, resolved_at: DateTime<Utc>) -> Self {
        Self {
            pct_change: Some(pct_change),
            status: HorizonStatus::Ok,
            adjusted_pct_change: None,
            resolved_at: Some(resolved_at),
        }
    }

    #[must_use]
    pub fn adjusted(pct_change: Decimal, resolved_at: DateTime<Utc>) -> Self {
        Self {
            pct_change: None,
            status: HorizonStatus::Adjusted,
            adjusted_pct_change: Some(pct_change),
            resolved_at: Some(resolved_at),
        }
    }

    #[must_use]
    pub fn missing() -> Self {
        Self {
            pct_change: None,
            status: HorizonStatus::Missing,
            adjusted_pct_change: None,
            resolved_at: None,
        }
    }

    /// Value usable for statistics: the exact change when `Ok`, the
    /// forward-filled change when `Adjusted`, nothing when `Missing`.
    #[must_use]
    pub fn effective_change(&self) -> Option<Decimal> {
        match self.status {
            HorizonStatus::Ok => self.pct_change,
            HorizonStatus::Adjusted => self.adjusted_pct_change,
            HorizonStatus::Missing => None,
        }
    }

    #[must_use]
    pub fn effective_change_f64(&self) -> Option<f64> {
        self.effective_change().and_then(|d| d.to_f64())
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status != HorizonStatus::Missing
    }
}

/// Baseline and horizon outcomes for one (event, symbol) pair.
/// Created once by the aligner and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub event_id: String,
    pub symbol: String,
    pub baseline_price: Option<Decimal>,
    pub baseline_timestamp: Option<DateTime<Utc>>,
    pub horizon_results: BTreeMap<u32, HorizonResult>,
}

impl ImpactRecord {
    /// Record with no baseline: every horizon is `Missing`.
    pub fn unresolved(
        event_id: impl Into<String>,
        symbol: impl Into<String>,
        horizons: &[u32],
    ) -> Self {
        Self {
            event_id: event_id.into(),
            symbol: symbol.into(),
            baseline_price: None,
            baseline_timestamp: None,
            horizon_results: horizons
                .iter()
                .map(|h| (*h, HorizonResult::missing()))
                .collect(),
        }
    }

    #[must_use]
    pub fn has_baseline(&self) -> bool {
        self.baseline_price.is_some()
    }

    #[must_use]
    pub fn horizon(&self, hours: u32) -> Option<&HorizonResult> {
        self.horizon_results.get(&hours)
    }

    #[must_use]
    pub fn all_missing(&self) -> bool {
        self.horizon_results.values().all(|r| !r.is_resolved())
    }

    #[must_use]
    pub fn any_resolved(&self) -> bool {
        !self.all_missing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 16, 0, 0).unwrap()
    }

    #[test]
    fn pct_change_present_only_when_ok() {
        let ok = HorizonResult::ok(dec!(1.25), ts());
        let adjusted = HorizonResult::adjusted(dec!(-0.40), ts());
        let missing = HorizonResult::missing();

        for result in [&ok, &adjusted, &missing] {
            assert_eq!(
                result.pct_change.is_none(),
                result.status != HorizonStatus::Ok
            );
        }
    }

    #[test]
    fn effective_change_includes_adjusted() {
        assert_eq!(HorizonResult::ok(dec!(1.25), ts()).effective_change(), Some(dec!(1.25)));
        assert_eq!(
            HorizonResult::adjusted(dec!(-0.40), ts()).effective_change(),
            Some(dec!(-0.40))
        );
        assert_eq!(HorizonResult::missing().effective_change(), None);
    }

    #[test]
    fn unresolved_record_is_all_missing() {
        let record = ImpactRecord::unresolved("e1", "TSLA", &[1, 6, 12, 24]);
        assert_eq!(record.horizon_results.len(), 4);
        assert!(record.all_missing());
        assert!(!record.has_baseline());
    }

    #[test]
    fn missing_horizon_serializes_null_change() {
        let json = serde_json::to_value(HorizonResult::missing()).unwrap();
        assert!(json["pct_change"].is_null());
        assert_eq!(json["status"], "MISSING");
    }
}
