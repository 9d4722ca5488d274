//! Exchange trading calendar.
//!
//! Sessions are evaluated in the exchange's local time zone so daylight
//! saving transitions are handled by `chrono-tz`.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Where a timestamp falls relative to the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketSession {
    MarketHours,
    PreMarket,
    AfterHours,
    Overnight,
    /// Weekend or exchange holiday.
    Weekend,
}

impl MarketSession {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MarketHours => "MARKET_HOURS",
            Self::PreMarket => "PRE_MARKET",
            Self::AfterHours => "AFTER_HOURS",
            Self::Overnight => "OVERNIGHT",
            Self::Weekend => "WEEKEND",
        }
    }

    pub const ALL: [Self; 5] = [
        Self::MarketHours,
        Self::PreMarket,
        Self::AfterHours,
        Self::Overnight,
        Self::Weekend,
    ];
}

/// Trading hours plus a holiday predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketCalendar {
    pub timezone: Tz,
    pub pre_market_open: NaiveTime,
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub after_hours_close: NaiveTime,
    pub holidays: BTreeSet<NaiveDate>,
}

impl Default for MarketCalendar {
    fn default() -> Self {
        Self::us_equities()
    }
}

/// Days scanned by [`MarketCalendar::next_open`] before giving up.
const MAX_SCAN_DAYS: i64 = 31;

impl MarketCalendar {
    /// NYSE/Nasdaq regular and extended hours in US/Eastern.
    #[must_use]
    pub fn us_equities() -> Self {
        Self {
            timezone: chrono_tz::US::Eastern,
            pre_market_open: hm(4, 0),
            open: hm(9, 30),
            close: hm(16, 0),
            after_hours_close: hm(20, 0),
            holidays: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(holidays);
        self
    }

    #[must_use]
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    #[must_use]
    pub fn session(&self, at: DateTime<Utc>) -> MarketSession {
        let local = at.with_timezone(&self.timezone);
        if !self.is_trading_day(local.date_naive()) {
            return MarketSession::Weekend;
        }

        let time = local.time();
        if time >= self.open && time < self.close {
            MarketSession::MarketHours
        } else if time >= self.pre_market_open && time < self.open {
            MarketSession::PreMarket
        } else if time >= self.close && time < self.after_hours_close {
            MarketSession::AfterHours
        } else {
            MarketSession::Overnight
        }
    }

    #[must_use]
    pub fn is_market_open(&self, at: DateTime<Utc>) -> bool {
        self.session(at) == MarketSession::MarketHours
    }

    /// Start of the next regular session at or after `at`; `at` itself when the market is open.
    #[must_use]
    pub fn next_open(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.is_market_open(at) {
            return Some(at);
        }

        let local = at.with_timezone(&self.timezone);
        let start = local.date_naive();

        (0..MAX_SCAN_DAYS)
            .filter_map(|offset| start.checked_add_signed(Duration::days(offset)))
            .filter(|date| self.is_trading_day(*date))
            .filter_map(|date| {
                self.timezone
                    .from_local_datetime(&date.and_time(self.open))
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            })
            .find(|open| *open >= at)
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    // ============================================
    // session Tests
    // ============================================

    #[test]
    fn session_classifies_winter_weekday() {
        let cal = MarketCalendar::us_equities();
        // Tuesday 2024-01-16, EST = UTC-5
        assert_eq!(cal.session(utc(2024, 1, 16, 15, 0)), MarketSession::MarketHours);
        assert_eq!(cal.session(utc(2024, 1, 16, 14, 29)), MarketSession::PreMarket);
        assert_eq!(cal.session(utc(2024, 1, 16, 14, 30)), MarketSession::MarketHours);
        assert_eq!(cal.session(utc(2024, 1, 16, 21, 0)), MarketSession::AfterHours);
        assert_eq!(cal.session(utc(2024, 1, 17, 2, 0)), MarketSession::Overnight);
        assert_eq!(cal.session(utc(2024, 1, 16, 8, 0)), MarketSession::Overnight);
    }

    #[test]
    fn session_follows_daylight_saving() {
        let cal = MarketCalendar::us_equities();
        // Tuesday 2024-07-16, EDT = UTC-4: 13:30 UTC is 09:30 local
        assert_eq!(cal.session(utc(2024, 7, 16, 13, 30)), MarketSession::MarketHours);
        assert_eq!(cal.session(utc(2024, 7, 16, 20, 0)), MarketSession::AfterHours);
    }

    #[test]
    fn session_weekend_and_holiday() {
        let holiday = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let cal = MarketCalendar::us_equities().with_holidays([holiday]);
        assert_eq!(cal.session(utc(2024, 1, 13, 16, 0)), MarketSession::Weekend);
        assert_eq!(cal.session(utc(2024, 7, 4, 15, 0)), MarketSession::Weekend);
    }

    // ============================================
    // next_open Tests
    // ============================================

    #[test]
    fn next_open_returns_same_instant_when_open() {
        let cal = MarketCalendar::us_equities();
        let t = utc(2024, 1, 16, 15, 0);
        assert_eq!(cal.next_open(t), Some(t));
    }

    #[test]
    fn next_open_after_close_is_next_morning() {
        let cal = MarketCalendar::us_equities();
        assert_eq!(
            cal.next_open(utc(2024, 1, 16, 22, 0)),
            Some(utc(2024, 1, 17, 14, 30))
        );
    }

    #[test]
    fn next_open_pre_market_is_same_day() {
        let cal = MarketCalendar::us_equities();
        assert_eq!(
            cal.next_open(utc(2024, 1, 16, 12, 0)),
            Some(utc(2024, 1, 16, 14, 30))
        );
    }

    #[test]
    fn next_open_skips_weekend_and_holiday() {
        let holiday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let cal = MarketCalendar::us_equities().with_holidays([holiday]);
        // Friday evening -> Monday is a holiday -> Tuesday open
        assert_eq!(
            cal.next_open(utc(2024, 1, 12, 22, 0)),
            Some(utc(2024, 1, 16, 14, 30))
        );
    }
}
