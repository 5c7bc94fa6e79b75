//! Data layer: price series, the Alpha Vantage boundary and request pacing
//! Series keys are validated `YYYY-MM-DD` dates; ticker and score checks live in [`validation`]

pub mod alpha_vantage;
pub mod errors;
pub mod rate_limiter;
pub mod retry;

// Re-export commonly used types
pub use alpha_vantage::{AlphaVantageClient, DailyBar, NewsItem, OutputSize, StockQuote};
pub use errors::{DataError, DataResult};
pub use rate_limiter::{RateLimitConfig, RateLimiter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a zero-padded ISO-8601 calendar date (`YYYY-MM-DD`).
///
/// Anything else is rejected so that date ordering is always chronological.
pub fn parse_date(raw: &str) -> DataResult<NaiveDate> {
    if raw.len() != 10 {
        return Err(DataError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| DataError::InvalidDate(raw.to_string()))
}

/// Closing prices keyed by calendar date, always iterated in chronological order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct PriceSeries {
    prices: BTreeMap<NaiveDate, f64>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from `YYYY-MM-DD` string keys, validating every key
    pub fn from_map<I, K>(entries: I) -> DataResult<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut prices = BTreeMap::new();
        for (date, price) in entries {
            prices.insert(parse_date(date.as_ref())?, price);
        }
        Ok(Self { prices })
    }

    pub fn insert(&mut self, date: NaiveDate, price: f64) -> Option<f64> {
        self.prices.insert(date, price)
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.prices.get(date).copied()
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.prices.contains_key(date)
    }

    /// Dates in ascending order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.prices.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &f64)> {
        self.prices.iter()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.prices.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.prices.keys().next_back().copied()
    }
}

impl FromIterator<(NaiveDate, f64)> for PriceSeries {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, f64)>>(iter: T) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<HashMap<String, f64>> for PriceSeries {
    type Error = DataError;

    fn try_from(map: HashMap<String, f64>) -> DataResult<Self> {
        Self::from_map(map)
    }
}

impl From<PriceSeries> for BTreeMap<String, f64> {
    fn from(series: PriceSeries) -> Self {
        series
            .prices
            .into_iter()
            .map(|(date, price)| (date.format(DATE_FORMAT).to_string(), price))
            .collect()
    }
}

/// Validation helpers
pub mod validation {
    use super::*;

    /// Validate a ticker symbol as accepted by the provider (e.g. `AAPL`, `BRK.B`)
    pub fn validate_symbol(symbol: &str) -> DataResult<()> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("symbol cannot be empty".to_string()));
        }

        if symbol.len() > 10 {
            return Err(DataError::InvalidSymbol(format!("{} is longer than 10 characters", symbol)));
        }

        if !symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(DataError::InvalidSymbol(format!(
                "{} may only contain letters, digits, '.' or '-'",
                symbol
            )));
        }

        Ok(())
    }

    /// Validate sentiment score
    pub fn validate_sentiment_score(score: f64) -> DataResult<()> {
        if !(-1.0..=1.0).contains(&score) {
            return Err(DataError::parse_error(format!(
                "Sentiment score must be between -1.0 and 1.0, got {}",
                score
            )));
        }
        Ok(())
    }
}
