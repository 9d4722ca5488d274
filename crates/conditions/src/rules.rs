//! Partition rules.
//!
//! A rule looks at one event (with its label and impact record) and either
//! names a bucket or declines. Partitions hold rules in declaration order and
//! the first rule that names a bucket wins.

use regex::Regex;
use sentiment_impact_core::{
    EngineError, Event, ImpactRecord, KeywordSet, MarketCalendar, PatternSet, SentimentCategory,
    SentimentLabel,
};

/// Everything a rule may inspect for one event.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub event: &'a Event,
    pub label: Option<&'a SentimentLabel>,
    pub record: Option<&'a ImpactRecord>,
}

impl<'a> EventContext<'a> {
    #[must_use]
    pub fn new(event: &'a Event) -> Self {
        Self {
            event,
            label: None,
            record: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: Option<&'a SentimentLabel>) -> Self {
        self.label = label;
        self
    }

    #[must_use]
    pub fn with_record(mut self, record: Option<&'a ImpactRecord>) -> Self {
        self.record = record;
        self
    }
}

/// A predicate that maps an event to a bucket label, or declines.
pub trait ConditionRule: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn classify(&self, ctx: &EventContext<'_>) -> Option<String>;
}

/// Matches events whose sentiment label has the given category.
#[derive(Debug, Clone)]
pub struct SentimentRule {
    category: SentimentCategory,
}

impl SentimentRule {
    #[must_use]
    pub fn new(category: SentimentCategory) -> Self {
        Self { category }
    }
}

impl ConditionRule for SentimentRule {
    fn name(&self) -> &str {
        self.category.as_str()
    }

    fn classify(&self, ctx: &EventContext<'_>) -> Option<String> {
        ctx.label
            .filter(|l| l.category == self.category)
            .map(|_| self.category.as_str().to_string())
    }
}

/// Matches events whose weighted engagement score is at least `min_score`.
#[derive(Debug, Clone)]
pub struct EngagementTierRule {
    label: String,
    min_score: f64,
    reshare_weight: f64,
}

impl EngagementTierRule {
    pub fn new(label: impl Into<String>, min_score: f64, reshare_weight: f64) -> Self {
        Self {
            label: label.into(),
            min_score,
            reshare_weight,
        }
    }
}

impl ConditionRule for EngagementTierRule {
    fn name(&self) -> &str {
        &self.label
    }

    fn classify(&self, ctx: &EventContext<'_>) -> Option<String> {
        (ctx.event.engagement.score(self.reshare_weight) >= self.min_score)
            .then(|| self.label.clone())
    }
}

/// Labels every event with its market session.
#[derive(Debug, Clone)]
pub struct SessionRule {
    calendar: MarketCalendar,
}

impl SessionRule {
    #[must_use]
    pub fn new(calendar: MarketCalendar) -> Self {
        Self { calendar }
    }
}

impl ConditionRule for SessionRule {
    fn name(&self) -> &str {
        "session"
    }

    fn classify(&self, ctx: &EventContext<'_>) -> Option<String> {
        Some(self.calendar.session(ctx.event.timestamp).as_str().to_string())
    }
}

/// Matches events whose text contains any keyword of a set.
///
/// Single words match whole tokens only; inflections must be listed.
/// Multi-word keywords match as substrings.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    label: String,
    words: Vec<String>,
    phrases: Vec<String>,
}

impl KeywordRule {
    #[must_use]
    pub fn new(set: &KeywordSet) -> Self {
        let (phrases, words): (Vec<String>, Vec<String>) = set
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .partition(|k| k.contains(' '));
        Self {
            label: set.label.clone(),
            words,
            phrases,
        }
    }

    fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        if self.phrases.iter().any(|p| lower.contains(p.as_str())) {
            return true;
        }
        lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .any(|token| self.words.iter().any(|w| w == token))
    }
}

impl ConditionRule for KeywordRule {
    fn name(&self) -> &str {
        &self.label
    }

    fn classify(&self, ctx: &EventContext<'_>) -> Option<String> {
        self.matches(&ctx.event.text).then(|| self.label.clone())
    }
}

/// Matches events whose text matches any regular expression of a set.
#[derive(Debug, Clone)]
pub struct PatternRule {
    label: String,
    patterns: Vec<Regex>,
}

impl PatternRule {
    /// Compiles every pattern of `set`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first pattern that fails to compile.
    pub fn new(label: impl Into<String>, set: &PatternSet) -> Result<Self, EngineError> {
        let patterns = set
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    EngineError::invalid_config(format!(
                        "flag '{}': bad pattern '{}': {}",
                        set.name, p, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            label: label.into(),
            patterns,
        })
    }
}

impl ConditionRule for PatternRule {
    fn name(&self) -> &str {
        &self.label
    }

    fn classify(&self, ctx: &EventContext<'_>) -> Option<String> {
        self.patterns
            .iter()
            .any(|re| re.is_match(&ctx.event.text))
            .then(|| self.label.clone())
    }
}

/// Matches events whose impact record resolved a baseline price.
#[derive(Debug, Clone, Default)]
pub struct BaselineRule;

impl ConditionRule for BaselineRule {
    fn name(&self) -> &str {
        "baseline"
    }

    fn classify(&self, ctx: &EventContext<'_>) -> Option<String> {
        ctx.record
            .filter(|r| r.has_baseline())
            .map(|_| "RESOLVED".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(text: &str) -> Event {
        // Tuesday 10:00 ET
        Event::new("e1", Utc.with_ymd_and_hms(2024, 1, 16, 15, 0, 0).unwrap(), text)
    }

    #[test]
    fn sentiment_rule_matches_category_only() {
        let ev = event("x");
        let label = SentimentLabel::new("e1", SentimentCategory::Bearish, 0.9, "llm");
        let ctx = EventContext::new(&ev).with_label(Some(&label));

        assert_eq!(
            SentimentRule::new(SentimentCategory::Bearish).classify(&ctx),
            Some("BEARISH".to_string())
        );
        assert_eq!(SentimentRule::new(SentimentCategory::Bullish).classify(&ctx), None);
        assert_eq!(
            SentimentRule::new(SentimentCategory::Bearish).classify(&EventContext::new(&ev)),
            None
        );
    }

    #[test]
    fn engagement_rule_is_inclusive_at_threshold() {
        let rule = EngagementTierRule::new("MEDIUM", 10_000.0, 2.0);

        let at = event("x").with_engagement(8_000, 1_000);
        assert_eq!(rule.classify(&EventContext::new(&at)), Some("MEDIUM".to_string()));

        let below = event("x").with_engagement(9_999, 0);
        assert_eq!(rule.classify(&EventContext::new(&below)), None);
    }

    #[test]
    fn session_rule_uses_calendar() {
        let ev = event("x");
        let rule = SessionRule::new(MarketCalendar::us_equities());
        assert_eq!(
            rule.classify(&EventContext::new(&ev)),
            Some("MARKET_HOURS".to_string())
        );
    }

    #[test]
    fn keyword_rule_matches_whole_words_and_phrases() {
        let rule = KeywordRule::new(&KeywordSet::new("PRODUCT", &["launch", "launching", "new model"]));

        assert!(rule.matches("Launching next week"));
        assert!(rule.matches("Launch!"));
        assert!(rule.matches("the NEW MODEL is here"));
        assert!(!rule.matches("relaunch"));
        assert!(!rule.matches("launcher for sale"));
        assert!(!rule.matches("nothing relevant"));
    }

    #[test]
    fn default_topics_ignore_words_sharing_a_prefix() {
        let config = sentiment_impact_core::PartitionConfig::default();
        let technology = config
            .topics
            .iter()
            .find(|t| t.label == "TECHNOLOGY")
            .unwrap();
        let rule = KeywordRule::new(technology);
        let classify = |text: &str| rule.classify(&EventContext::new(&event(text)));

        assert_eq!(classify("Flying to the airport again"), None);
        assert_eq!(classify("Stock split aimed at retail"), None);
        assert_eq!(classify("Lunch at Chipotle"), None);
        assert_eq!(classify("New AI chips shipping"), Some("TECHNOLOGY".to_string()));
        assert_eq!(classify("Robots in the factory"), Some("TECHNOLOGY".to_string()));
    }

    #[test]
    fn pattern_rule_matches_any_pattern() {
        let set = PatternSet::new("contains_metrics", &[r"\d+%", r"\$\d+"]);
        let rule = PatternRule::new("TRUE", &set).unwrap();

        assert!(rule.classify(&EventContext::new(&event("up 12% today"))).is_some());
        assert!(rule.classify(&EventContext::new(&event("only $5"))).is_some());
        assert!(rule.classify(&EventContext::new(&event("flat"))).is_none());
    }

    #[test]
    fn pattern_rule_rejects_bad_regex() {
        let set = PatternSet::new("broken", &["(unclosed"]);
        assert!(matches!(
            PatternRule::new("TRUE", &set),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn baseline_rule_reads_record() {
        let ev = event("x");
        let record = ImpactRecord::unresolved("e1", "TSLA", &[1]);
        let ctx = EventContext::new(&ev).with_record(Some(&record));
        assert_eq!(BaselineRule.classify(&ctx), None);
    }
}
