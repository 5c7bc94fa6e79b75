use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::analysis::EventWindow;
use crate::data::alpha_vantage::DEFAULT_BASE_URL;
use crate::data::RateLimitConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    pub rate_limit: RateLimitSettings,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: usize,
    pub window_seconds: u64,
    pub safety_margin_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub window_before: usize,
    pub window_after: usize,
}

impl RateLimitSettings {
    pub fn to_limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.max_requests,
            window: Duration::from_secs(self.window_seconds),
            safety_margin: Duration::from_millis(self.safety_margin_ms),
        }
    }
}

impl AnalysisConfig {
    pub fn window(&self) -> EventWindow {
        EventWindow {
            before: self.window_before,
            after: self.window_after,
        }
    }
}

fn var_or<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Invalid {} value", key))
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file - this sets env vars that aren't already set
        dotenv::dotenv().ok();

        let api_key = env::var("ALPHA_VANTAGE_API_KEY").unwrap_or_else(|_| "demo".to_string());
        if api_key == "demo" {
            tracing::warn!("ALPHA_VANTAGE_API_KEY not set, using the 'demo' key (IBM only)");
        }

        let config = Config {
            provider: ProviderConfig {
                api_key,
                base_url: env::var("ALPHA_VANTAGE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                timeout_seconds: var_or("HTTP_TIMEOUT_SECONDS", "30")?,
                max_attempts: var_or("RETRY_MAX_ATTEMPTS", "3")?,
            },
            rate_limit: RateLimitSettings {
                max_requests: var_or("RATE_LIMIT_MAX_REQUESTS", "5")?,
                window_seconds: var_or("RATE_LIMIT_WINDOW_SECONDS", "60")?,
                safety_margin_ms: var_or("RATE_LIMIT_SAFETY_MARGIN_MS", "1000")?,
            },
            analysis: AnalysisConfig {
                window_before: var_or("EVENT_WINDOW_BEFORE", "30")?,
                window_after: var_or("EVENT_WINDOW_AFTER", "30")?,
            },
        };

        if config.rate_limit.max_requests == 0 {
            anyhow::bail!("RATE_LIMIT_MAX_REQUESTS must be at least 1");
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                api_key: "demo".to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_seconds: 30,
                max_attempts: 3,
            },
            rate_limit: RateLimitSettings {
                max_requests: 5,
                window_seconds: 60,
                safety_margin_ms: 1000,
            },
            analysis: AnalysisConfig {
                window_before: 30,
                window_after: 30,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_limiter_defaults() {
        let config = Config::default();
        let limiter = config.rate_limit.to_limiter_config();
        let defaults = RateLimitConfig::default();

        assert_eq!(limiter.max_requests, defaults.max_requests);
        assert_eq!(limiter.window, defaults.window);
        assert_eq!(limiter.safety_margin, defaults.safety_margin);
        assert_eq!(config.analysis.window(), EventWindow::default());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["provider"].get("api_key").is_none());
        assert_eq!(json["provider"]["base_url"], DEFAULT_BASE_URL);
    }
}
