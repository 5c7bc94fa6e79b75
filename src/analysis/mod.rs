//! Financial analytics: event studies, sentiment-impact signals and reports

pub mod event_study;
pub mod news_sentiment;
pub mod report;
pub mod returns;
pub mod sentiment_impact;

// Re-export commonly used items
pub use event_study::{compute_abnormal_returns, AbnormalReturn, EventStudy, EventWindow};
pub use news_sentiment::{summarize_news, NewsSentimentSummary};
pub use report::{DashboardSummary, EventAnalysis, EventRequest, EventType};
pub use returns::{daily_returns, simple_return, DailyReturn};
pub use sentiment_impact::{
    classify_sentiment_impact, Correlation, Recommendation, SentimentImpact, Strength,
};
