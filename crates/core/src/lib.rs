pub mod calendar;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod impact;
pub mod input;
pub mod price;
pub mod sentiment;

pub use calendar::{MarketCalendar, MarketSession};
pub use config::{
    AlignmentConfig, AnalysisConfig, BootstrapConfig, CategoryWeights, CoverageWindow,
    EngagementThresholds, EngineConfig, KeywordSet, MethodologyConfig, MinimumSamples,
    OffHoursPolicy, PartitionConfig, PatternSet, QualityConfig, SentimentEncoding,
    SeverityPenalties,
};
pub use config_loader::ConfigLoader;
pub use error::{EngineError, Flag, MarketDataError, SentimentError};
pub use events::{parse_events, parse_timestamp, Engagement, Event, RawEvent};
pub use impact::{HorizonResult, HorizonStatus, ImpactRecord};
pub use input::validate_inputs;
pub use price::{MarketDataSource, PriceBar, PriceSeries};
pub use sentiment::{
    complete_labels, label_events, Classification, KeywordSentiment, SentimentCategory,
    SentimentLabel, SentimentSource, KEYWORD_FALLBACK_SOURCE,
};
