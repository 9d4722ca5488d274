//! Shared input arguments and loading for every subcommand.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use clap::Args;
use sentiment_impact_core::{ConfigLoader, EngineConfig, Event, PriceSeries, SentimentLabel};
use sentiment_impact_data::{collect_series, read_events, read_labels, required_window, CsvMarketData};

/// Inputs common to `evaluate`, `validate` and `align`.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// JSON array of events (`id`, `timestamp`, `text`, optional `engagement`)
    #[arg(long)]
    pub events: PathBuf,

    /// JSON array of sentiment labels; unlabeled events fall back to keyword sentiment
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Directory holding one `<SYMBOL>.csv` OHLCV file per symbol
    #[arg(long)]
    pub prices_dir: PathBuf,

    /// Symbol to align against (repeatable); added to the configured symbols
    #[arg(long = "symbol")]
    pub symbols: Vec<String>,

    /// Engine configuration TOML (defaults to config/Engine.toml when present)
    #[arg(short, long, env = "IMPACT_CONFIG")]
    pub config: Option<String>,

    /// Output format: text, json (default: json)
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format: '{}'. Valid formats: text, json", s)),
        }
    }
}

/// Everything a run needs, loaded from disk.
#[derive(Debug)]
pub struct LoadedInputs {
    pub events: Vec<Event>,
    pub labels: Vec<SentimentLabel>,
    pub series_by_symbol: BTreeMap<String, PriceSeries>,
    pub config: EngineConfig,
}

impl InputArgs {
    pub fn load_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path))?,
            None => ConfigLoader::load()?,
        };

        for symbol in &self.symbols {
            if !config.symbols.contains(symbol) {
                config.symbols.push(symbol.clone());
            }
        }
        if config.symbols.is_empty() {
            return Err(anyhow!("No symbols given; pass --symbol or set symbols in the config"));
        }
        Ok(config)
    }

    pub fn load(&self) -> Result<LoadedInputs> {
        let config = self.load_config()?;
        let events = read_events(&self.events)?;
        let labels = match &self.labels {
            Some(path) => read_labels(path)?,
            None => Vec::new(),
        };
        tracing::info!("Loaded {} events and {} labels", events.len(), labels.len());

        let max_horizon = config.alignment.horizons_hours.iter().copied().max().unwrap_or(0);
        let padding = config.alignment.max_forward_fill() + Duration::days(1);
        let series_by_symbol = match required_window(&events, max_horizon, padding) {
            Some((start, end)) => {
                let source = CsvMarketData::new(&self.prices_dir);
                collect_series(&source, &config.symbols, start, end)
            }
            None => BTreeMap::new(),
        };

        Ok(LoadedInputs {
            events,
            labels,
            series_by_symbol,
            config,
        })
    }

    pub fn format(&self) -> Result<OutputFormat> {
        OutputFormat::parse(&self.format)
    }

    /// Writes `content` to the output file, or stdout when none was given.
    pub fn emit(&self, content: &str) -> Result<()> {
        match &self.output {
            Some(path) => {
                fs::write(path, content)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!("Wrote {}", path.display());
            }
            None => println!("{}", content),
        }
        Ok(())
    }
}
