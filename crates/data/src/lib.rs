//! Market data loading and event alignment.
//!
//! This crate provides:
//! - CSV-backed [`MarketDataSource`](sentiment_impact_core::MarketDataSource)
//! - JSON loaders for events and labels
//! - The [`Aligner`], which turns events and price series into impact records

pub mod aligner;
pub mod csv_storage;
pub mod json_input;
pub mod source;

pub use aligner::{pct_change, Aligner};
pub use csv_storage::CsvMarketData;
pub use json_input::{parse_events_json, read_events, read_labels};
pub use source::{collect_series, required_window};
