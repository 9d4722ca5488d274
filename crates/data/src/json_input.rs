//! JSON loaders for events and sentiment labels.

use std::path::Path;

use anyhow::{Context, Result};
use sentiment_impact_core::{parse_events, Event, RawEvent, SentimentLabel};

/// Reads a JSON array of events.
///
/// # Errors
/// Returns error if the file cannot be read, is not valid JSON, or holds an
/// unparseable timestamp.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file: {}", path.display()))?;
    parse_events_json(&text)
}

/// Parses a JSON array of events from a string.
///
/// # Errors
/// Returns error on invalid JSON or an unparseable timestamp.
pub fn parse_events_json(text: &str) -> Result<Vec<Event>> {
    let raw: Vec<RawEvent> = serde_json::from_str(text).context("Invalid events JSON")?;
    Ok(parse_events(raw)?)
}

/// Reads a JSON array of sentiment labels.
///
/// # Errors
/// Returns error if the file cannot be read or is not valid JSON.
pub fn read_labels(path: &Path) -> Result<Vec<SentimentLabel>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read labels file: {}", path.display()))?;
    serde_json::from_str(&text).context("Invalid labels JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentiment_impact_core::{EngineError, SentimentCategory};

    #[test]
    fn parses_both_timestamp_forms() {
        let json = r#"[
            {"id": "1", "timestamp": "2024-01-16T15:00:00Z", "text": "Deliveries up",
             "engagement": {"likes": 1200, "reshares": 300}},
            {"id": "2", "timestamp": "Tue Jan 16 16:00:00 +0000 2024", "text": "Quiet day"}
        ]"#;

        let events = parse_events_json(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].engagement.likes, 1200);
        assert_eq!(events[1].author, "");
    }

    #[test]
    fn bad_timestamp_surfaces_malformed_error() {
        let json = r#"[{"id": "1", "timestamp": "noon", "text": "x"}]"#;
        let err = parse_events_json(json).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InputMalformed { .. })
        ));
    }

    #[test]
    fn labels_deserialize_from_json() {
        let json = r#"[{"event_id": "1", "category": "BULLISH", "confidence": 0.8, "source": "llm"}]"#;
        let labels: Vec<SentimentLabel> = serde_json::from_str(json).unwrap();
        assert_eq!(labels[0].category, SentimentCategory::Bullish);
    }
}
