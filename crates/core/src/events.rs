use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Engagement counters attached to a social post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub reshares: u64,
}

impl Engagement {
    /// Weighted engagement score: `likes + reshare_weight * reshares`.
    #[must_use]
    pub fn score(&self, reshare_weight: f64) -> f64 {
        self.likes as f64 + reshare_weight * self.reshares as f64
    }
}

/// A timestamped social post. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub engagement: Engagement,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Event {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            text: text.into(),
            author: String::new(),
            engagement: Engagement::default(),
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_engagement(mut self, likes: u64, reshares: u64) -> Self {
        self.engagement = Engagement { likes, reshares };
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
}

/// An event as delivered by a collector, before timestamp parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub timestamp: String,
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub engagement: Engagement,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl TryFrom<RawEvent> for Event {
    type Error = EngineError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| {
            EngineError::malformed(format!(
                "event {}: unparseable timestamp '{}'",
                raw.id, raw.timestamp
            ))
        })?;

        Ok(Self {
            id: raw.id,
            timestamp,
            text: raw.text,
            author: raw.author,
            engagement: raw.engagement,
            metadata: raw.metadata,
        })
    }
}

/// Parses an RFC 3339 timestamp or the legacy `Wed Jan 15 14:30:00 +0000 2024` form.
///
/// Naive timestamps without an offset are rejected.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%a %b %d %H:%M:%S %z %Y"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Converts a batch of raw events, failing on the first malformed one.
///
/// # Errors
///
/// Returns `InputMalformed` if any timestamp cannot be parsed.
pub fn parse_events(raw: Vec<RawEvent>) -> Result<Vec<Event>, EngineError> {
    raw.into_iter().map(Event::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(id: &str, timestamp: &str) -> RawEvent {
        RawEvent {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            text: "Deliveries ahead of schedule".to_string(),
            author: "ceo".to_string(),
            engagement: Engagement {
                likes: 1200,
                reshares: 300,
            },
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn engagement_score_weights_reshares() {
        let engagement = Engagement {
            likes: 1000,
            reshares: 250,
        };
        assert!((engagement.score(2.0) - 1500.0).abs() < f64::EPSILON);
        assert!((engagement.score(1.0) - 1250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-03-04T10:15:00-05:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 4, 15, 15, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_accepts_legacy_format() {
        let ts = parse_timestamp("Mon Jan 15 14:30:00 +0000 2024").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_rejects_naive_and_garbage() {
        assert!(parse_timestamp("2024-03-04 10:15:00").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn raw_event_converts() {
        let event = Event::try_from(raw("e1", "2024-03-04T15:15:00Z")).unwrap();
        assert_eq!(event.id, "e1");
        assert_eq!(event.engagement.likes, 1200);
    }

    #[test]
    fn unparseable_timestamp_is_input_malformed() {
        let err = parse_events(vec![raw("ok", "2024-03-04T15:15:00Z"), raw("bad", "not a date")])
            .unwrap_err();
        assert!(matches!(err, EngineError::InputMalformed { .. }));
        assert!(err.to_string().contains("bad"));
    }
}
