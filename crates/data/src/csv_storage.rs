use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sentiment_impact_core::{MarketDataError, MarketDataSource, PriceBar, PriceSeries};

/// Market data source backed by one CSV file per symbol: `<root>/<SYMBOL>.csv`.
///
/// Format: timestamp,symbol,open,high,low,close,volume
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    root: PathBuf,
}

impl CsvMarketData {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.root.join(format!("{symbol}.csv"))
    }

    /// Reads every bar for `symbol` from a CSV file.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row fails to parse.
    pub fn read_ohlcv(path: &Path, symbol: &str) -> Result<PriceSeries> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        Self::read_ohlcv_from(file, symbol)
    }

    /// Reads bars for `symbol` from any CSV reader; rows for other symbols are skipped.
    ///
    /// # Errors
    /// Returns error if a row has missing columns or unparseable values.
    pub fn read_ohlcv_from<R: Read>(reader: R, symbol: &str) -> Result<PriceSeries> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for (line, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() < 7 {
                return Err(anyhow!("row {}: expected 7 columns, got {}", line + 1, record.len()));
            }
            if &record[1] != symbol {
                skipped += 1;
                continue;
            }

            let timestamp: DateTime<Utc> = record[0]
                .parse()
                .with_context(|| format!("row {}: bad timestamp '{}'", line + 1, &record[0]))?;
            let open = Decimal::from_str(&record[2])?;
            let high = Decimal::from_str(&record[3])?;
            let low = Decimal::from_str(&record[4])?;
            let close = Decimal::from_str(&record[5])?;
            let volume = Decimal::from_str(&record[6])?;

            bars.push(PriceBar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} rows not belonging to {}", skipped, symbol);
        }

        // Sorted by timestamp inside PriceSeries::new
        Ok(PriceSeries::new(symbol, bars))
    }
}

impl MarketDataSource for CsvMarketData {
    fn bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries, MarketDataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(MarketDataError::Unavailable {
                symbol: symbol.to_string(),
                reason: format!("no file at {}", path.display()),
            });
        }

        let series = Self::read_ohlcv(&path, symbol).map_err(|e| MarketDataError::Parse {
            symbol: symbol.to_string(),
            reason: format!("{e:#}"),
        })?;

        let in_range: Vec<PriceBar> = series
            .bars()
            .iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .cloned()
            .collect();

        Ok(PriceSeries::new(symbol, in_range))
    }
}
