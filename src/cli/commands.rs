use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::analysis::{
    classify_sentiment_impact, compute_abnormal_returns, summarize_news, EventAnalysis,
    EventRequest, EventType, EventWindow,
};
use crate::config::Config;
use crate::data::alpha_vantage::{AlphaVantageClient, OutputSize};
use crate::data::validation::{validate_sentiment_score, validate_symbol};
use crate::data::RateLimiter;

fn client(config: &Config) -> Result<AlphaVantageClient> {
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.to_limiter_config()));
    AlphaVantageClient::new(&config.provider, limiter).context("Failed to build Alpha Vantage client")
}

fn window_or_default(config: &Config, before: Option<usize>, after: Option<usize>) -> EventWindow {
    let defaults = config.analysis.window();
    EventWindow {
        before: before.unwrap_or(defaults.before),
        after: after.unwrap_or(defaults.after),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn quote(config: &Config, symbol: String) -> Result<()> {
    validate_symbol(&symbol)?;
    let quote = client(config)?.fetch_quote(&symbol).await?;
    print_json(&quote)
}

pub async fn overview(config: &Config, symbol: String) -> Result<()> {
    validate_symbol(&symbol)?;
    let overview = client(config)?.fetch_overview(&symbol).await?;
    print_json(&overview)
}

pub async fn news(config: &Config, symbol: String, limit: u32) -> Result<()> {
    validate_symbol(&symbol)?;
    let feed = client(config)?
        .fetch_news_sentiment(std::slice::from_ref(&symbol), limit)
        .await?;
    let summary = summarize_news(&symbol, &feed.feed);

    print_json(&serde_json::json!({
        "summary": summary,
        "feed": feed.feed,
    }))
}

pub async fn movers(config: &Config) -> Result<()> {
    let movers = client(config)?.fetch_top_movers().await?;
    print_json(&movers)
}

pub async fn search(config: &Config, keywords: String) -> Result<()> {
    let matches = client(config)?.search_symbols(&keywords).await?;
    print_json(&matches)
}

pub async fn event_study(
    config: &Config,
    symbol: String,
    benchmark: String,
    event_date: String,
    before: Option<usize>,
    after: Option<usize>,
) -> Result<()> {
    validate_symbol(&symbol)?;
    validate_symbol(&benchmark)?;

    let window = window_or_default(config, before, after);

    let client = client(config)?;
    let subject = client.fetch_daily_series(&symbol, OutputSize::Full).await?;
    let market = client.fetch_daily_series(&benchmark, OutputSize::Full).await?;

    let study = compute_abnormal_returns(&subject.closes(), &market.closes(), &event_date, window)
        .with_context(|| format!("Event study for {} on {} failed", symbol, event_date))?;

    print_json(&study)
}

/// Offline classification; out-of-range scores are classified anyway
pub fn classify(score: f64, price_change: f64) -> Result<()> {
    if let Err(e) = validate_sentiment_score(score) {
        warn!("{}", e);
    }
    print_json(&classify_sentiment_impact(score, price_change))
}

/// Flags of the `analyze` command besides the symbols and date
pub struct AnalyzeOptions {
    pub event_type: Option<EventType>,
    pub before: Option<usize>,
    pub after: Option<usize>,
    pub use_quote: bool,
    pub limit: u32,
}

pub async fn analyze(
    config: &Config,
    symbol: String,
    benchmark: String,
    event_date: String,
    options: AnalyzeOptions,
) -> Result<()> {
    validate_symbol(&symbol)?;
    validate_symbol(&benchmark)?;

    let client = client(config)?;
    let subject = client.fetch_daily_series(&symbol, OutputSize::Full).await?;
    let market = client.fetch_daily_series(&benchmark, OutputSize::Full).await?;

    let news = match client
        .fetch_news_sentiment(std::slice::from_ref(&symbol), options.limit)
        .await
    {
        Ok(feed) => Some(summarize_news(&symbol, &feed.feed)),
        Err(e) => {
            warn!("News sentiment unavailable for {}: {}, classifying without it", symbol, e);
            None
        }
    };

    let quote_change = if options.use_quote {
        match client.fetch_quote(&symbol).await {
            Ok(quote) => Some(quote.change_percent),
            Err(e) => {
                warn!("Quote unavailable for {}: {}, classifying the window CAR", symbol, e);
                None
            }
        }
    } else {
        None
    };

    let request = EventRequest {
        symbol,
        benchmark,
        event_date,
        event_type: options.event_type,
        window: window_or_default(config, options.before, options.after),
    };

    let analysis = EventAnalysis::build(&request, &subject.closes(), &market.closes(), news, quote_change)
        .with_context(|| format!("Event analysis for {} on {} failed", request.symbol, request.event_date))?;

    print_json(&analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_flags_override_config() {
        let config = Config::default();

        assert_eq!(window_or_default(&config, None, None), EventWindow { before: 30, after: 30 });
        assert_eq!(
            window_or_default(&config, Some(0), Some(5)),
            EventWindow { before: 0, after: 5 }
        );
    }
}
