//! Structural validation run before any stage.
//!
//! Only malformed input fails here. Duplicates, gaps, and missing labels are
//! data-quality findings and are left to the quality validator.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::events::Event;
use crate::price::PriceSeries;
use crate::sentiment::SentimentLabel;

/// Validates the structural shape of all inputs.
///
/// # Errors
///
/// Returns `InputMalformed` for an empty event set, an empty event id, a
/// label confidence outside [0, 1], or a non-positive price.
pub fn validate_inputs(
    events: &[Event],
    labels: &[SentimentLabel],
    series_by_symbol: &BTreeMap<String, PriceSeries>,
) -> Result<(), EngineError> {
    if events.is_empty() {
        return Err(EngineError::malformed("event set is empty"));
    }

    if let Some(pos) = events.iter().position(|e| e.id.trim().is_empty()) {
        return Err(EngineError::malformed(format!("event at index {pos} has an empty id")));
    }

    for label in labels {
        label.validate()?;
    }

    for series in series_by_symbol.values() {
        series.validate()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::PriceBar;
    use crate::sentiment::SentimentCategory;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn events() -> Vec<Event> {
        vec![Event::new(
            "e1",
            Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
            "hello",
        )]
    }

    #[test]
    fn empty_event_set_is_malformed() {
        let err = validate_inputs(&[], &[], &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn negative_confidence_is_malformed() {
        let labels = vec![SentimentLabel::new("e1", SentimentCategory::Bullish, -0.2, "llm")];
        assert!(matches!(
            validate_inputs(&events(), &labels, &BTreeMap::new()),
            Err(EngineError::InputMalformed { .. })
        ));
    }

    #[test]
    fn zero_price_is_malformed() {
        let mut series = BTreeMap::new();
        series.insert(
            "TSLA".to_string(),
            PriceSeries::new(
                "TSLA",
                vec![PriceBar::flat(
                    Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
                    dec!(0),
                )],
            ),
        );
        assert!(validate_inputs(&events(), &[], &series).is_err());
    }

    #[test]
    fn duplicates_are_not_structural() {
        let mut evs = events();
        evs.push(evs[0].clone());
        assert!(validate_inputs(&evs, &[], &BTreeMap::new()).is_ok());
    }
}
