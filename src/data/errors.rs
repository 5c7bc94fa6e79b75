use thiserror::Error;

/// Error types for data access and analytics
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("API error: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimit { retry_after: u64 },

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("No data available for {symbol}: {detail}")]
    NoData { symbol: String, detail: String },

    #[error("Event date {date} not found in price data")]
    NotFound { date: String },

    #[error("Invalid price {price} on {date}")]
    InvalidPrice { date: String, price: f64 },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Network(_) => true,
            DataError::RateLimit { .. } => true,
            DataError::Api { status_code, .. } => {
                // Retry on server errors (5xx) and rate limiting (429)
                *status_code >= 500 || *status_code == 429
            }
            _ => false,
        }
    }

    /// Get retry delay in seconds for retryable errors
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            DataError::RateLimit { retry_after } => Some(*retry_after),
            DataError::Network(_) => Some(1),
            DataError::Api { status_code, .. } if *status_code >= 500 => Some(5),
            _ => None,
        }
    }

    /// Create a parse error with context
    pub fn parse_error<S: Into<String>>(message: S) -> Self {
        DataError::Parse {
            message: message.into(),
        }
    }

    /// Create an API error with status code
    pub fn api_error<S: Into<String>>(status_code: u16, message: S) -> Self {
        DataError::Api {
            status_code,
            message: message.into(),
        }
    }

    pub fn no_data<S: Into<String>, D: Into<String>>(symbol: S, detail: D) -> Self {
        DataError::NoData {
            symbol: symbol.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DataError::RateLimit { retry_after: 60 }.is_retryable());
        assert!(DataError::api_error(503u16, "unavailable").is_retryable());
        assert!(DataError::api_error(429u16, "slow down").is_retryable());
        assert!(!DataError::api_error(400u16, "bad request").is_retryable());
        assert!(!DataError::NotFound { date: "2024-01-01".to_string() }.is_retryable());
        assert!(!DataError::Cancelled.is_retryable());
        assert!(!DataError::InvalidSymbol("AAPL MSFT".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_delay() {
        assert_eq!(DataError::RateLimit { retry_after: 60 }.retry_delay(), Some(60));
        assert_eq!(DataError::api_error(500u16, "boom").retry_delay(), Some(5));
        assert_eq!(DataError::InvalidDate("x".to_string()).retry_delay(), None);
    }

    #[test]
    fn test_not_found_message() {
        let err = DataError::NotFound { date: "2024-03-01".to_string() };
        assert_eq!(err.to_string(), "Event date 2024-03-01 not found in price data");
    }
}
