// event-impact - financial event analytics
// Event-study abnormal returns, news sentiment-impact signals and a
// rate-limited Alpha Vantage client behind a small CLI.

#![deny(clippy::unwrap_used)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod data;

// Re-export commonly used items
pub use analysis::{
    classify_sentiment_impact, compute_abnormal_returns, AbnormalReturn, EventStudy, EventWindow,
    SentimentImpact,
};
pub use config::Config;
pub use data::{DataError, DataResult, PriceSeries, RateLimitConfig, RateLimiter};
