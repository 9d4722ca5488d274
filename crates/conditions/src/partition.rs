//! Condition partitioning.
//!
//! A [`Partition`] is an ordered list of rules. Single-valued partitions give
//! every event exactly one label (first matching rule, else the default
//! label). Flag partitions put every event in either `TRUE` or `FALSE`.
//! Buckets are recomputed from scratch on every call.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use sentiment_impact_core::{
    EngineConfig, EngineError, Event, ImpactRecord, SentimentCategory, SentimentLabel,
};

use crate::rules::{
    BaselineRule, ConditionRule, EngagementTierRule, EventContext, KeywordRule, PatternRule,
    SentimentRule, SessionRule,
};

pub const FLAG_TRUE: &str = "TRUE";
pub const FLAG_FALSE: &str = "FALSE";

/// One named group of events inside a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionBucket {
    pub partition_name: String,
    pub bucket_label: String,
    pub event_ids: BTreeSet<String>,
}

impl ConditionBucket {
    #[must_use]
    pub fn len(&self) -> usize {
        self.event_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartitionKind {
    /// Exactly one label per event.
    Single,
    /// Independent boolean membership.
    Flag,
}

pub struct Partition {
    name: String,
    kind: PartitionKind,
    default_label: String,
    rules: Vec<Box<dyn ConditionRule>>,
}

impl std::fmt::Debug for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default_label", &self.default_label)
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Partition {
    /// Single-valued partition; events no rule claims get `default_label`.
    pub fn single(name: impl Into<String>, default_label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PartitionKind::Single,
            default_label: default_label.into(),
            rules: Vec::new(),
        }
    }

    /// Flag partition; an event is `TRUE` when any rule matches.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PartitionKind::Flag,
            default_label: FLAG_FALSE.to_string(),
            rules: Vec::new(),
        }
    }

    /// Appends a rule after the existing ones.
    #[must_use]
    pub fn with_rule(mut self, rule: Box<dyn ConditionRule>) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> PartitionKind {
        self.kind
    }

    /// Label for one event.
    #[must_use]
    pub fn label_for(&self, ctx: &EventContext<'_>) -> String {
        let matched = self.rules.iter().find_map(|rule| rule.classify(ctx));
        match self.kind {
            PartitionKind::Single => matched.unwrap_or_else(|| self.default_label.clone()),
            PartitionKind::Flag => {
                if matched.is_some() {
                    FLAG_TRUE.to_string()
                } else {
                    FLAG_FALSE.to_string()
                }
            }
        }
    }
}

/// Result of partitioning: `partition_name -> bucket_label -> event_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partitions {
    pub buckets: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl Partitions {
    #[must_use]
    pub fn get(&self, partition: &str, label: &str) -> Option<&BTreeSet<String>> {
        self.buckets.get(partition).and_then(|b| b.get(label))
    }

    #[must_use]
    pub fn partition_names(&self) -> Vec<&str> {
        self.buckets.keys().map(String::as_str).collect()
    }

    /// All buckets, ordered by partition name then bucket label.
    #[must_use]
    pub fn to_buckets(&self) -> Vec<ConditionBucket> {
        self.buckets
            .iter()
            .flat_map(|(partition, labels)| {
                labels.iter().map(move |(label, ids)| ConditionBucket {
                    partition_name: partition.clone(),
                    bucket_label: label.clone(),
                    event_ids: ids.clone(),
                })
            })
            .collect()
    }

    /// Buckets of one partition, ordered by label.
    #[must_use]
    pub fn buckets_of(&self, partition: &str) -> Vec<ConditionBucket> {
        self.buckets
            .get(partition)
            .map(|labels| {
                labels
                    .iter()
                    .map(|(label, ids)| ConditionBucket {
                        partition_name: partition.to_string(),
                        bucket_label: label.clone(),
                        event_ids: ids.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Holds the declared partitions and assigns events to buckets.
#[derive(Debug, Default)]
pub struct Partitioner {
    partitions: Vec<Partition>,
}

impl Partitioner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a partition.
    pub fn register(&mut self, partition: Partition) {
        self.partitions.push(partition);
    }

    #[must_use]
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Builds the standard partitions: sentiment, engagement, time of day,
    /// topic, price data, then one flag partition per configured pattern set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a flag pattern fails to compile.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut partitioner = Self::new();

        let sentiment = SentimentCategory::ALL.iter().fold(
            Partition::single("sentiment", "UNLABELED"),
            |p, category| p.with_rule(Box::new(SentimentRule::new(*category))),
        );
        partitioner.register(sentiment);

        let weight = config.partition.reshare_weight;
        let thresholds = config.partition.engagement;
        partitioner.register(
            Partition::single("engagement", "LOW")
                .with_rule(Box::new(EngagementTierRule::new("HIGH", thresholds.high, weight)))
                .with_rule(Box::new(EngagementTierRule::new("MEDIUM", thresholds.medium, weight))),
        );

        partitioner.register(
            Partition::single("time_of_day", "UNKNOWN")
                .with_rule(Box::new(SessionRule::new(config.calendar.clone()))),
        );

        let topic = config
            .partition
            .topics
            .iter()
            .fold(Partition::single("topic", "OTHER"), |p, set| {
                p.with_rule(Box::new(KeywordRule::new(set)))
            });
        partitioner.register(topic);

        partitioner
            .register(Partition::single("price_data", "MISSING").with_rule(Box::new(BaselineRule)));

        for set in &config.partition.flags {
            let rule = PatternRule::new(FLAG_TRUE, set)?;
            partitioner.register(Partition::flag(set.name.clone()).with_rule(Box::new(rule)));
        }

        Ok(partitioner)
    }

    /// Assigns every event to its buckets.
    ///
    /// `records` should hold the impact records of a single symbol; when an
    /// event has several labels or records, the first one is used.
    #[must_use]
    pub fn partition(
        &self,
        events: &[Event],
        labels: &[SentimentLabel],
        records: &[ImpactRecord],
    ) -> Partitions {
        let mut label_by_id: HashMap<&str, &SentimentLabel> = HashMap::new();
        for label in labels {
            label_by_id.entry(label.event_id.as_str()).or_insert(label);
        }
        let mut record_by_id: HashMap<&str, &ImpactRecord> = HashMap::new();
        for record in records {
            record_by_id.entry(record.event_id.as_str()).or_insert(record);
        }

        let mut result = Partitions::default();
        for event in events {
            let ctx = EventContext::new(event)
                .with_label(label_by_id.get(event.id.as_str()).copied())
                .with_record(record_by_id.get(event.id.as_str()).copied());

            for partition in &self.partitions {
                let label = partition.label_for(&ctx);
                result
                    .buckets
                    .entry(partition.name.clone())
                    .or_default()
                    .entry(label)
                    .or_default()
                    .insert(event.id.clone());
            }
        }

        tracing::debug!(
            "Partitioned {} events into {} partitions",
            events.len(),
            result.buckets.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(day: u32, hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn fixture() -> (Vec<Event>, Vec<SentimentLabel>) {
        let events = vec![
            // Tuesday 10:00 ET
            Event::new("1", ts(16, 15), "Launching the new factory, production up 20%")
                .with_engagement(60_000, 0),
            // Tuesday 18:00 ET
            Event::new("2", ts(16, 23), "Earnings will beat guidance").with_engagement(5_000, 3_000),
            // Saturday
            Event::new("3", ts(20, 15), "Good morning").with_engagement(10, 0),
        ];
        let labels = vec![
            SentimentLabel::new("1", SentimentCategory::Bullish, 0.9, "llm"),
            SentimentLabel::new("2", SentimentCategory::Bearish, 0.7, "llm"),
        ];
        (events, labels)
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    // ============================================
    // Single-valued partitions
    // ============================================

    #[test]
    fn every_event_gets_exactly_one_label_per_single_partition() {
        let (events, labels) = fixture();
        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();
        let result = partitioner.partition(&events, &labels, &[]);

        for partition in partitioner.partitions() {
            let buckets = &result.buckets[partition.name()];
            let total: usize = buckets.values().map(BTreeSet::len).sum();
            assert_eq!(total, events.len(), "partition {}", partition.name());
        }
    }

    #[test]
    fn sentiment_unlabeled_events_get_default() {
        let (events, labels) = fixture();
        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();
        let result = partitioner.partition(&events, &labels, &[]);

        assert_eq!(result.get("sentiment", "BULLISH"), Some(&ids(&["1"])));
        assert_eq!(result.get("sentiment", "BEARISH"), Some(&ids(&["2"])));
        assert_eq!(result.get("sentiment", "UNLABELED"), Some(&ids(&["3"])));
        assert_eq!(result.get("sentiment", "NEUTRAL"), None);
    }

    #[test]
    fn engagement_tiers_follow_thresholds() {
        let (events, labels) = fixture();
        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();
        let result = partitioner.partition(&events, &labels, &[]);

        assert_eq!(result.get("engagement", "HIGH"), Some(&ids(&["1"])));
        // 5000 + 2 * 3000 = 11000
        assert_eq!(result.get("engagement", "MEDIUM"), Some(&ids(&["2"])));
        assert_eq!(result.get("engagement", "LOW"), Some(&ids(&["3"])));
    }

    #[test]
    fn time_of_day_uses_sessions() {
        let (events, labels) = fixture();
        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();
        let result = partitioner.partition(&events, &labels, &[]);

        assert_eq!(result.get("time_of_day", "MARKET_HOURS"), Some(&ids(&["1"])));
        assert_eq!(result.get("time_of_day", "AFTER_HOURS"), Some(&ids(&["2"])));
        assert_eq!(result.get("time_of_day", "WEEKEND"), Some(&ids(&["3"])));
    }

    #[test]
    fn topic_first_declared_match_wins() {
        let (events, labels) = fixture();
        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();
        let result = partitioner.partition(&events, &labels, &[]);

        // Event 1 hits PRODUCT ("launching") and MANUFACTURING ("factory"); PRODUCT is declared first
        assert_eq!(result.get("topic", "PRODUCT"), Some(&ids(&["1"])));
        assert_eq!(result.get("topic", "FINANCIAL"), Some(&ids(&["2"])));
        assert_eq!(result.get("topic", "OTHER"), Some(&ids(&["3"])));
    }

    #[test]
    fn appended_rule_extends_partition() {
        let (events, labels) = fixture();
        let mut partitioner = Partitioner::new();
        partitioner.register(
            Partition::single("custom", "REST")
                .with_rule(Box::new(KeywordRule::new(&sentiment_impact_core::KeywordSet::new(
                    "GREETING",
                    &["morning"],
                )))),
        );

        let result = partitioner.partition(&events, &labels, &[]);
        assert_eq!(result.get("custom", "GREETING"), Some(&ids(&["3"])));
        assert_eq!(result.get("custom", "REST"), Some(&ids(&["1", "2"])));
    }

    // ============================================
    // Flag partitions
    // ============================================

    #[test]
    fn flags_split_true_and_false() {
        let (events, labels) = fixture();
        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();
        let result = partitioner.partition(&events, &labels, &[]);

        assert_eq!(result.get("forward_looking", FLAG_TRUE), Some(&ids(&["2"])));
        assert_eq!(result.get("forward_looking", FLAG_FALSE), Some(&ids(&["1", "3"])));
        assert_eq!(result.get("contains_metrics", FLAG_TRUE), Some(&ids(&["1"])));
        assert_eq!(result.get("product_announcement", FLAG_TRUE), Some(&ids(&["1"])));
    }

    #[test]
    fn price_data_partition_reads_records() {
        let (events, labels) = fixture();
        let mut resolved = ImpactRecord::unresolved("1", "TSLA", &[1]);
        resolved.baseline_price = Some(rust_decimal_macros::dec!(100));
        let records = vec![resolved, ImpactRecord::unresolved("2", "TSLA", &[1])];

        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();
        let result = partitioner.partition(&events, &labels, &records);

        assert_eq!(result.get("price_data", "RESOLVED"), Some(&ids(&["1"])));
        assert_eq!(result.get("price_data", "MISSING"), Some(&ids(&["2", "3"])));
    }

    #[test]
    fn partitioning_is_recomputed_fresh() {
        let (events, labels) = fixture();
        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();

        let first = partitioner.partition(&events, &labels, &[]);
        let second = partitioner.partition(&events[..1], &labels, &[]);

        assert_ne!(first, second);
        assert_eq!(second.get("sentiment", "BULLISH"), Some(&ids(&["1"])));
        assert_eq!(second.get("sentiment", "UNLABELED"), None);
    }

    #[test]
    fn to_buckets_flattens_in_order() {
        let (events, labels) = fixture();
        let partitioner = Partitioner::from_config(&EngineConfig::default()).unwrap();
        let buckets = partitioner.partition(&events, &labels, &[]).to_buckets();

        let first = &buckets[0];
        assert_eq!(first.partition_name, "contains_metrics");
        assert_eq!(first.bucket_label, FLAG_FALSE);
        assert_eq!(first.len(), 2);
    }
}
