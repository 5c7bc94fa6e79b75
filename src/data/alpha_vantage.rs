use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

use super::{parse_date, DataError, DataResult, PriceSeries, RateLimiter};
use crate::config::ProviderConfig;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Latest quote from the GLOBAL_QUOTE endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume: u64,
    pub latest_trading_day: NaiveDate,
    pub previous_close: f64,
    pub change: f64,
    /// Percent, e.g. `2.5` for +2.5%
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// TIME_SERIES_DAILY payload, bars in ascending date order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySeries {
    pub symbol: String,
    pub last_refreshed: Option<String>,
    pub bars: Vec<DailyBar>,
}

impl DailySeries {
    /// Closing prices keyed by date, the input shape of the event study
    pub fn closes(&self) -> PriceSeries {
        self.bars.iter().map(|bar| (bar.date, bar.close)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSize {
    /// Latest 100 bars
    Compact,
    /// Full history
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Company fundamentals from the OVERVIEW endpoint; `None` where the provider reports "None" or "-"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub symbol: String,
    pub asset_type: String,
    pub name: String,
    pub description: String,
    pub exchange: String,
    pub currency: String,
    pub country: String,
    pub sector: String,
    pub industry: String,
    pub market_capitalization: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub book_value: Option<f64>,
    pub dividend_per_share: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub eps: Option<f64>,
    pub beta: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
}

/// Provider sentiment bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bearish,
    #[serde(rename = "Somewhat-Bearish")]
    SomewhatBearish,
    Neutral,
    #[serde(rename = "Somewhat-Bullish")]
    SomewhatBullish,
    Bullish,
}

impl SentimentLabel {
    /// x <= -0.35 Bearish, up to -0.15 Somewhat-Bearish, below 0.15 Neutral,
    /// below 0.35 Somewhat-Bullish, otherwise Bullish
    pub fn from_score(score: f64) -> Self {
        if score <= -0.35 {
            SentimentLabel::Bearish
        } else if score <= -0.15 {
            SentimentLabel::SomewhatBearish
        } else if score < 0.15 {
            SentimentLabel::Neutral
        } else if score < 0.35 {
            SentimentLabel::SomewhatBullish
        } else {
            SentimentLabel::Bullish
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bearish => "Bearish",
            SentimentLabel::SomewhatBearish => "Somewhat-Bearish",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::SomewhatBullish => "Somewhat-Bullish",
            SentimentLabel::Bullish => "Bullish",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSentiment {
    pub ticker: String,
    #[serde(deserialize_with = "f64_from_str_or_number")]
    pub relevance_score: f64,
    #[serde(deserialize_with = "f64_from_str_or_number")]
    pub ticker_sentiment_score: f64,
    pub ticker_sentiment_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub time_published: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub summary: String,
    pub source: String,
    #[serde(default)]
    pub category_within_source: String,
    #[serde(deserialize_with = "f64_from_str_or_number")]
    pub overall_sentiment_score: f64,
    pub overall_sentiment_label: SentimentLabel,
    #[serde(default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

impl NewsItem {
    /// Sentiment toward `ticker` if the article scores it, else `None`
    pub fn sentiment_for(&self, ticker: &str) -> Option<&TickerSentiment> {
        self.ticker_sentiment
            .iter()
            .find(|t| t.ticker.eq_ignore_ascii_case(ticker))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsFeed {
    pub feed: Vec<NewsItem>,
    pub sentiment_score_definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMover {
    pub ticker: String,
    pub price: f64,
    pub change_amount: f64,
    pub change_percentage: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopMovers {
    pub top_gainers: Vec<MarketMover>,
    pub top_losers: Vec<MarketMover>,
    pub most_actively_traded: Vec<MarketMover>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    #[serde(rename = "1. symbol")]
    pub symbol: String,
    #[serde(rename = "2. name")]
    pub name: String,
    #[serde(rename = "3. type")]
    pub kind: String,
    #[serde(rename = "4. region")]
    pub region: String,
    #[serde(rename = "5. marketOpen")]
    pub market_open: String,
    #[serde(rename = "6. marketClose")]
    pub market_close: String,
    #[serde(rename = "7. timezone")]
    pub timezone: String,
    #[serde(rename = "8. currency")]
    pub currency: String,
    #[serde(rename = "9. matchScore", deserialize_with = "f64_from_str_or_number")]
    pub match_score: f64,
}

/// Alpha Vantage returns most numbers as strings
fn f64_from_str_or_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    max_attempts: usize,
    limiter: Arc<RateLimiter>,
}

impl AlphaVantageClient {
    pub fn new(config: &ProviderConfig, limiter: Arc<RateLimiter>) -> DataResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("event-impact/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DataError::Config(format!("Invalid base URL {}: {}", config.base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            max_attempts: config.max_attempts.max(1),
            limiter,
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub async fn fetch_quote(&self, symbol: &str) -> DataResult<StockQuote> {
        let symbol = symbol.to_uppercase();
        tracing::info!("Fetching quote for {}", symbol);

        let data = self
            .fetch(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol.as_str())])
            .await?;
        parse_quote(&symbol, &data)
    }

    pub async fn fetch_daily_series(&self, symbol: &str, output_size: OutputSize) -> DataResult<DailySeries> {
        let symbol = symbol.to_uppercase();
        tracing::info!("Fetching daily series for {} ({})", symbol, output_size.as_str());

        let data = self
            .fetch(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol.as_str()),
                ("outputsize", output_size.as_str()),
            ])
            .await?;
        let series = parse_daily_series(&symbol, &data)?;

        tracing::info!("Fetched {} daily bars for {}", series.bars.len(), symbol);
        Ok(series)
    }

    pub async fn fetch_overview(&self, symbol: &str) -> DataResult<CompanyOverview> {
        let symbol = symbol.to_uppercase();
        tracing::info!("Fetching company overview for {}", symbol);

        let data = self.fetch(&[("function", "OVERVIEW"), ("symbol", symbol.as_str())]).await?;
        parse_overview(&symbol, &data)
    }

    /// Latest news with sentiment for the given tickers
    pub async fn fetch_news_sentiment(&self, tickers: &[String], limit: u32) -> DataResult<NewsFeed> {
        let tickers = tickers
            .iter()
            .map(|t| t.to_uppercase())
            .collect::<Vec<_>>()
            .join(",");
        let limit = limit.to_string();
        tracing::info!("Fetching news sentiment for {} (limit {})", tickers, limit);

        let data = self
            .fetch(&[
                ("function", "NEWS_SENTIMENT"),
                ("tickers", tickers.as_str()),
                ("limit", limit.as_str()),
                ("sort", "LATEST"),
            ])
            .await?;
        parse_news_feed(&data)
    }

    pub async fn fetch_top_movers(&self) -> DataResult<TopMovers> {
        tracing::info!("Fetching top gainers and losers");
        let data = self.fetch(&[("function", "TOP_GAINERS_LOSERS")]).await?;
        parse_top_movers(&data)
    }

    pub async fn search_symbols(&self, keywords: &str) -> DataResult<Vec<SymbolMatch>> {
        let keywords = keywords.trim();
        tracing::info!("Searching symbols for '{}'", keywords);

        let data = self
            .fetch(&[("function", "SYMBOL_SEARCH"), ("keywords", keywords)])
            .await?;
        parse_symbol_matches(&data)
    }

    async fn fetch(&self, params: &[(&str, &str)]) -> DataResult<Value> {
        use super::retry::retry_with_backoff;

        retry_with_backoff(|| self.fetch_once(params), self.max_attempts).await
    }

    async fn fetch_once(&self, params: &[(&str, &str)]) -> DataResult<Value> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("apikey", &self.api_key);

        self.limiter.reserve().await;

        tracing::debug!("Alpha Vantage request: GET {}", redact_api_key(&url));

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!("Alpha Vantage request failed ({}): {}", status_code, error_text);
            return Err(DataError::api_error(status_code, error_text));
        }

        let body: Value = response.json().await?;
        check_api_errors(&body)?;
        Ok(body)
    }
}

/// Copy of `url` with every `apikey` value replaced, safe to log
pub fn redact_api_key(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "apikey" { "***".into() } else { value.into_owned() };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

/// Detect error payloads the provider returns with HTTP 200
pub fn check_api_errors(body: &Value) -> DataResult<()> {
    if let Some(message) = body
        .get("Error Message")
        .or_else(|| body.get("Error"))
        .and_then(Value::as_str)
    {
        return Err(DataError::api_error(400u16, message));
    }

    if let Some(note) = body.get("Note").and_then(Value::as_str) {
        if note.contains("API call frequency") {
            tracing::warn!("Alpha Vantage rate limit note: {}", note);
            return Err(DataError::RateLimit { retry_after: 60 });
        }
    }

    if let Some(info) = body.get("Information").and_then(Value::as_str) {
        if info.to_lowercase().contains("rate limit") {
            tracing::warn!("Alpha Vantage rate limit information: {}", info);
            return Err(DataError::RateLimit { retry_after: 60 });
        }
    }

    Ok(())
}

fn object<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    value.get(key).and_then(Value::as_object).filter(|o| !o.is_empty())
}

fn text_field(obj: &Map<String, Value>, key: &str) -> DataResult<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DataError::parse_error(format!("Missing field '{}'", key)))
}

fn number_field(obj: &Map<String, Value>, key: &str) -> DataResult<f64> {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| DataError::parse_error(format!("Field '{}' is not a float", key))),
        Some(Value::String(s)) => parse_number(s)
            .ok_or_else(|| DataError::parse_error(format!("Field '{}' is not numeric: {}", key, s))),
        _ => Err(DataError::parse_error(format!("Missing field '{}'", key))),
    }
}

fn volume_field(obj: &Map<String, Value>, key: &str) -> DataResult<u64> {
    let volume = number_field(obj, key)?;
    if volume < 0.0 {
        return Err(DataError::parse_error(format!("Negative volume in '{}'", key)));
    }
    Ok(volume as u64)
}

fn optional_number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Strips `%`, parentheses and whitespace the provider wraps numbers in
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '%' | '(' | ')' | ' '))
        .collect();
    match cleaned.as_str() {
        "" | "None" | "-" => None,
        s => s.parse().ok(),
    }
}

pub fn parse_quote(symbol: &str, data: &Value) -> DataResult<StockQuote> {
    let quote = object(data, "Global Quote")
        .ok_or_else(|| DataError::no_data(symbol, "no quote returned"))?;

    Ok(StockQuote {
        symbol: text_field(quote, "01. symbol")?,
        open: number_field(quote, "02. open")?,
        high: number_field(quote, "03. high")?,
        low: number_field(quote, "04. low")?,
        price: number_field(quote, "05. price")?,
        volume: volume_field(quote, "06. volume")?,
        latest_trading_day: parse_date(&text_field(quote, "07. latest trading day")?)?,
        previous_close: number_field(quote, "08. previous close")?,
        change: number_field(quote, "09. change")?,
        change_percent: number_field(quote, "10. change percent")?,
    })
}

pub fn parse_daily_series(symbol: &str, data: &Value) -> DataResult<DailySeries> {
    let series = object(data, "Time Series (Daily)")
        .ok_or_else(|| DataError::no_data(symbol, "no daily time series returned"))?;

    let last_refreshed = object(data, "Meta Data")
        .and_then(|meta| meta.get("3. Last Refreshed"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut bars = series
        .iter()
        .map(|(date, bar)| {
            let bar = bar
                .as_object()
                .ok_or_else(|| DataError::parse_error(format!("Malformed bar for {}", date)))?;
            Ok(DailyBar {
                date: parse_date(date)?,
                open: number_field(bar, "1. open")?,
                high: number_field(bar, "2. high")?,
                low: number_field(bar, "3. low")?,
                close: number_field(bar, "4. close")?,
                volume: volume_field(bar, "5. volume")?,
            })
        })
        .collect::<DataResult<Vec<_>>>()?;
    bars.sort_by_key(|bar| bar.date);

    Ok(DailySeries {
        symbol: symbol.to_string(),
        last_refreshed,
        bars,
    })
}

pub fn parse_overview(symbol: &str, data: &Value) -> DataResult<CompanyOverview> {
    let obj = data
        .as_object()
        .filter(|o| o.get("Symbol").and_then(Value::as_str).is_some())
        .ok_or_else(|| DataError::no_data(symbol, "no company overview returned"))?;

    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(CompanyOverview {
        symbol: text("Symbol"),
        asset_type: text("AssetType"),
        name: text("Name"),
        description: text("Description"),
        exchange: text("Exchange"),
        currency: text("Currency"),
        country: text("Country"),
        sector: text("Sector"),
        industry: text("Industry"),
        market_capitalization: optional_number(obj, "MarketCapitalization"),
        pe_ratio: optional_number(obj, "PERatio"),
        peg_ratio: optional_number(obj, "PEGRatio"),
        book_value: optional_number(obj, "BookValue"),
        dividend_per_share: optional_number(obj, "DividendPerShare"),
        dividend_yield: optional_number(obj, "DividendYield"),
        eps: optional_number(obj, "EPS"),
        beta: optional_number(obj, "Beta"),
        week_52_high: optional_number(obj, "52WeekHigh"),
        week_52_low: optional_number(obj, "52WeekLow"),
    })
}

pub fn parse_news_feed(data: &Value) -> DataResult<NewsFeed> {
    let feed = match data.get("feed") {
        Some(feed) => serde_json::from_value(feed.clone())?,
        None => Vec::new(),
    };
    let sentiment_score_definition = data
        .get("sentiment_score_definition")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(NewsFeed {
        feed,
        sentiment_score_definition,
    })
}

fn parse_movers(data: &Value, key: &str) -> DataResult<Vec<MarketMover>> {
    let Some(entries) = data.get(key).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    entries
        .iter()
        .map(|entry| {
            let obj = entry
                .as_object()
                .ok_or_else(|| DataError::parse_error(format!("Malformed entry in '{}'", key)))?;
            Ok(MarketMover {
                ticker: text_field(obj, "ticker")?,
                price: number_field(obj, "price")?,
                change_amount: number_field(obj, "change_amount")?,
                change_percentage: number_field(obj, "change_percentage")?,
                volume: volume_field(obj, "volume")?,
            })
        })
        .collect()
}

pub fn parse_top_movers(data: &Value) -> DataResult<TopMovers> {
    Ok(TopMovers {
        top_gainers: parse_movers(data, "top_gainers")?,
        top_losers: parse_movers(data, "top_losers")?,
        most_actively_traded: parse_movers(data, "most_actively_traded")?,
    })
}

pub fn parse_symbol_matches(data: &Value) -> DataResult<Vec<SymbolMatch>> {
    match data.get("bestMatches") {
        Some(matches) => Ok(serde_json::from_value(matches.clone())?),
        None => Ok(Vec::new()),
    }
}
