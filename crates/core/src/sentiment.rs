//! Sentiment labels and the classification collaborator contract.
//!
//! Classification itself is an upstream capability. This module only defines
//! the label shape, the [`SentimentSource`] seam, and the deterministic
//! keyword-tally fallback used when the source is unavailable.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, SentimentError};
use crate::events::Event;

/// Source tag written on labels produced by [`KeywordSentiment`].
pub const KEYWORD_FALLBACK_SOURCE: &str = "keyword_fallback";

/// Directional sentiment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentCategory {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentCategory {
    /// Numeric encoding: +1 bullish, -1 bearish, 0 neutral.
    #[must_use]
    pub const fn numeric(&self) -> f64 {
        match self {
            Self::Bullish => 1.0,
            Self::Bearish => -1.0,
            Self::Neutral => 0.0,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "BULLISH",
            Self::Bearish => "BEARISH",
            Self::Neutral => "NEUTRAL",
        }
    }

    pub const ALL: [Self; 3] = [Self::Bullish, Self::Bearish, Self::Neutral];
}

/// Sentiment label for one event, produced by an external classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentLabel {
    pub event_id: String,
    pub category: SentimentCategory,
    pub confidence: f64,
    pub source: String,
}

impl SentimentLabel {
    pub fn new(
        event_id: impl Into<String>,
        category: SentimentCategory,
        confidence: f64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            category,
            confidence,
            source: source.into(),
        }
    }

    /// Confidence-weighted signed score in [-1, 1].
    #[must_use]
    pub fn signed_score(&self) -> f64 {
        self.category.numeric() * self.confidence
    }

    /// Checks that confidence lies in [0, 1].
    ///
    /// # Errors
    ///
    /// Returns `InputMalformed` for a non-finite or out-of-range confidence.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(EngineError::malformed(format!(
                "label for event {}: confidence {} outside [0, 1]",
                self.event_id, self.confidence
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == KEYWORD_FALLBACK_SOURCE
    }
}

/// Output of a sentiment classifier for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: SentimentCategory,
    pub confidence: f64,
    pub rationale: String,
}

/// Pluggable sentiment classifier.
pub trait SentimentSource: Send + Sync {
    /// Classifies one text.
    ///
    /// # Errors
    ///
    /// Returns `ClassificationUnavailable` when the classifier cannot answer.
    fn classify(&self, text: &str) -> Result<Classification, SentimentError>;

    /// Tag recorded as the label source.
    fn name(&self) -> &str;
}

/// Deterministic keyword-tally classifier.
///
/// More bullish hits than bearish hits gives BULLISH, the reverse gives
/// BEARISH, and a tie (including zero hits) gives NEUTRAL.
#[derive(Debug, Clone)]
pub struct KeywordSentiment {
    bullish: Vec<String>,
    bearish: Vec<String>,
}

impl Default for KeywordSentiment {
    fn default() -> Self {
        Self::new(
            [
                "great", "amazing", "success", "wonderful", "best", "tremendous", "fantastic",
                "excellent", "incredible", "breakthrough", "record", "milestone", "leading",
                "proud", "excited", "ahead",
            ],
            [
                "bad", "terrible", "horrible", "failure", "disaster", "wrong", "problem",
                "issue", "delay", "recall", "investigation", "concern", "setback",
                "disappointing", "failing",
            ],
        )
    }
}

impl KeywordSentiment {
    pub fn new<I, J, S>(bullish: I, bearish: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bullish: bullish.into_iter().map(|k| k.into().to_lowercase()).collect(),
            bearish: bearish.into_iter().map(|k| k.into().to_lowercase()).collect(),
        }
    }

    /// Tallies keyword hits and returns (bullish, bearish) counts.
    #[must_use]
    pub fn tally(&self, text: &str) -> (usize, usize) {
        let lower = text.to_lowercase();
        let bullish = self.bullish.iter().filter(|kw| lower.contains(kw.as_str())).count();
        let bearish = self.bearish.iter().filter(|kw| lower.contains(kw.as_str())).count();
        (bullish, bearish)
    }

    #[must_use]
    pub fn classify_text(&self, text: &str) -> Classification {
        let (bullish, bearish) = self.tally(text);
        let category = match bullish.cmp(&bearish) {
            std::cmp::Ordering::Greater => SentimentCategory::Bullish,
            std::cmp::Ordering::Less => SentimentCategory::Bearish,
            std::cmp::Ordering::Equal => SentimentCategory::Neutral,
        };
        Classification {
            category,
            confidence: 0.5,
            rationale: format!("keyword tally: {bullish} bullish, {bearish} bearish"),
        }
    }

    #[must_use]
    pub fn label(&self, event: &Event) -> SentimentLabel {
        let classification = self.classify_text(&event.text);
        SentimentLabel::new(
            event.id.clone(),
            classification.category,
            classification.confidence,
            KEYWORD_FALLBACK_SOURCE,
        )
    }
}

impl SentimentSource for KeywordSentiment {
    fn classify(&self, text: &str) -> Result<Classification, SentimentError> {
        Ok(self.classify_text(text))
    }

    fn name(&self) -> &str {
        KEYWORD_FALLBACK_SOURCE
    }
}

/// Labels every event through `source`, falling back to the keyword rule
/// per event when the source reports `ClassificationUnavailable`.
pub fn label_events(events: &[Event], source: &dyn SentimentSource) -> Vec<SentimentLabel> {
    let fallback = KeywordSentiment::default();
    let mut fallbacks = 0usize;

    let labels = events
        .iter()
        .map(|event| match source.classify(&event.text) {
            Ok(classification) => SentimentLabel::new(
                event.id.clone(),
                classification.category,
                classification.confidence.clamp(0.0, 1.0),
                source.name(),
            ),
            Err(err) => {
                tracing::debug!("Falling back to keyword sentiment for {}: {}", event.id, err);
                fallbacks += 1;
                fallback.label(event)
            }
        })
        .collect();

    if fallbacks > 0 {
        tracing::warn!(
            "Sentiment source '{}' unavailable for {} of {} events; keyword fallback used",
            source.name(),
            fallbacks,
            events.len()
        );
    }

    labels
}

/// Returns `labels` plus a keyword-fallback label for every event that has none.
pub fn complete_labels(events: &[Event], labels: &[SentimentLabel]) -> Vec<SentimentLabel> {
    let labelled: HashSet<&str> = labels.iter().map(|l| l.event_id.as_str()).collect();
    let fallback = KeywordSentiment::default();

    let mut completed = labels.to_vec();
    let before = completed.len();
    completed.extend(
        events
            .iter()
            .filter(|event| !labelled.contains(event.id.as_str()))
            .map(|event| fallback.label(event)),
    );

    let added = completed.len() - before;
    if added > 0 {
        tracing::info!("Filled {} unlabeled events with keyword fallback labels", added);
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct Offline;

    impl SentimentSource for Offline {
        fn classify(&self, _text: &str) -> Result<Classification, SentimentError> {
            Err(SentimentError::ClassificationUnavailable("rate limited".to_string()))
        }

        fn name(&self) -> &str {
            "llm"
        }
    }

    struct AlwaysBullish;

    impl SentimentSource for AlwaysBullish {
        fn classify(&self, _text: &str) -> Result<Classification, SentimentError> {
            Ok(Classification {
                category: SentimentCategory::Bullish,
                confidence: 0.9,
                rationale: "test".to_string(),
            })
        }

        fn name(&self) -> &str {
            "llm"
        }
    }

    fn event(id: &str, text: &str) -> Event {
        Event::new(id, Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(), text)
    }

    #[test]
    fn numeric_encoding() {
        assert!((SentimentCategory::Bullish.numeric() - 1.0).abs() < f64::EPSILON);
        assert!((SentimentCategory::Bearish.numeric() + 1.0).abs() < f64::EPSILON);
        assert!(SentimentCategory::Neutral.numeric().abs() < f64::EPSILON);
    }

    #[test]
    fn signed_score_weights_by_confidence() {
        let label = SentimentLabel::new("e1", SentimentCategory::Bearish, 0.8, "llm");
        assert!((label.signed_score() + 0.8).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let negative = SentimentLabel::new("e1", SentimentCategory::Bullish, -0.1, "llm");
        let too_high = SentimentLabel::new("e2", SentimentCategory::Bullish, 1.01, "llm");
        let nan = SentimentLabel::new("e3", SentimentCategory::Bullish, f64::NAN, "llm");

        assert!(matches!(negative.validate(), Err(EngineError::InputMalformed { .. })));
        assert!(too_high.validate().is_err());
        assert!(nan.validate().is_err());
        assert!(SentimentLabel::new("e4", SentimentCategory::Neutral, 1.0, "llm")
            .validate()
            .is_ok());
    }

    #[test]
    fn keyword_tally_majority_wins() {
        let keywords = KeywordSentiment::default();
        assert_eq!(
            keywords.classify_text("Amazing quarter, record deliveries").category,
            SentimentCategory::Bullish
        );
        assert_eq!(
            keywords.classify_text("Another recall and a federal investigation").category,
            SentimentCategory::Bearish
        );
    }

    #[test]
    fn keyword_tie_is_neutral() {
        let keywords = KeywordSentiment::default();
        assert_eq!(
            keywords.classify_text("Great product, terrible rollout").category,
            SentimentCategory::Neutral
        );
        assert_eq!(
            keywords.classify_text("Meeting with the team today").category,
            SentimentCategory::Neutral
        );
    }

    #[test]
    fn label_events_falls_back_when_unavailable() {
        let events = vec![event("e1", "Incredible milestone"), event("e2", "Shipping update")];

        let labels = label_events(&events, &Offline);

        assert_eq!(labels.len(), 2);
        assert!(labels.iter().all(SentimentLabel::is_fallback));
        assert_eq!(labels[0].category, SentimentCategory::Bullish);
        assert_eq!(labels[1].category, SentimentCategory::Neutral);
    }

    #[test]
    fn label_events_uses_source_when_available() {
        let events = vec![event("e1", "terrible")];
        let labels = label_events(&events, &AlwaysBullish);
        assert_eq!(labels[0].category, SentimentCategory::Bullish);
        assert_eq!(labels[0].source, "llm");
    }

    #[test]
    fn complete_labels_only_fills_gaps() {
        let events = vec![event("e1", "great"), event("e2", "bad")];
        let labels = vec![SentimentLabel::new("e1", SentimentCategory::Neutral, 0.7, "llm")];

        let completed = complete_labels(&events, &labels);

        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].category, SentimentCategory::Neutral);
        assert_eq!(completed[1].event_id, "e2");
        assert_eq!(completed[1].category, SentimentCategory::Bearish);
        assert!(completed[1].is_fallback());
    }
}
