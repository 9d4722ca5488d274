//! Condition partitioning and per-bucket impact aggregation.

pub mod aggregate;
pub mod partition;
pub mod rules;

pub use aggregate::{
    bucket_values, describe, index_records, index_timestamps, Aggregator, BucketStats, Example,
    HorizonStats, Observation,
};
pub use partition::{
    ConditionBucket, Partition, PartitionKind, Partitioner, Partitions, FLAG_FALSE, FLAG_TRUE,
};
pub use rules::{
    BaselineRule, ConditionRule, EngagementTierRule, EventContext, KeywordRule, PatternRule,
    SentimentRule, SessionRule,
};
