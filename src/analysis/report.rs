//! Event analysis report and dashboard summary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::event_study::{compute_abnormal_returns, window_range, EventStudy, EventWindow};
use super::returns::{daily_returns, DailyReturn};
use super::news_sentiment::NewsSentimentSummary;
use super::sentiment_impact::{classify_sentiment_impact, Recommendation, SentimentImpact};
use crate::data::{DataResult, PriceSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Investment,
    Acquisition,
    Partnership,
    Funding,
}

/// What to analyse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRequest {
    pub symbol: String,
    pub benchmark: String,
    pub event_date: String,
    pub event_type: Option<EventType>,
    pub window: EventWindow,
}

/// Event study, news sentiment and the resulting signal for one event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAnalysis {
    pub symbol: String,
    pub benchmark: String,
    pub event_type: Option<EventType>,
    pub event_study: EventStudy,
    /// Subject closes and day-over-day returns across the window
    pub daily_returns: Vec<DailyReturn>,
    pub news: Option<NewsSentimentSummary>,
    /// Percent move fed to the classifier
    pub price_change: f64,
    pub verdict: SentimentImpact,
    pub generated_at: DateTime<Utc>,
}

impl EventAnalysis {
    /// Run the event study and classify the outcome.
    ///
    /// The price change is `quote_change` when supplied, otherwise the CAR at
    /// the end of the window. Without news the sentiment score is 0.
    pub fn build(
        request: &EventRequest,
        subject: &PriceSeries,
        benchmark: &PriceSeries,
        news: Option<NewsSentimentSummary>,
        quote_change: Option<f64>,
    ) -> DataResult<Self> {
        let event_study = compute_abnormal_returns(subject, benchmark, &request.event_date, request.window)?;

        let window_prices = window_prices(subject, &event_study);
        let daily_returns = daily_returns(&window_prices)?;

        let price_change = quote_change.unwrap_or_else(|| event_study.cumulative_abnormal_return());
        let sentiment_score = news.as_ref().map(|n| n.average_score).unwrap_or(0.0);
        let verdict = classify_sentiment_impact(sentiment_score, price_change);

        tracing::info!(
            symbol = %request.symbol,
            event_date = %request.event_date,
            records = event_study.len(),
            car = event_study.cumulative_abnormal_return(),
            recommendation = %verdict.recommendation,
            confidence = verdict.confidence,
            "Event analysis complete"
        );

        Ok(Self {
            symbol: request.symbol.to_uppercase(),
            benchmark: request.benchmark.to_uppercase(),
            event_type: request.event_type,
            event_study,
            daily_returns,
            news,
            price_change,
            verdict,
            generated_at: Utc::now(),
        })
    }
}

/// Subject closes from the first to the last position the study touched
fn window_prices(subject: &PriceSeries, study: &EventStudy) -> PriceSeries {
    let dates = subject.dates();
    let Ok(event_index) = dates.binary_search(&study.event_date) else {
        return PriceSeries::new();
    };

    let range = window_range(dates.len(), event_index, study.window);
    dates[range.start..=range.end]
        .iter()
        .filter_map(|date| subject.get(date).map(|price| (*date, price)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_events: usize,
    pub positive_recommendations: usize,
    pub average_confidence: f64,
    pub time_range: Option<TimeRange>,
}

impl DashboardSummary {
    pub fn from_analyses(analyses: &[EventAnalysis]) -> Self {
        let total_events = analyses.len();
        let positive_recommendations = analyses
            .iter()
            .filter(|a| a.verdict.recommendation == Recommendation::IncreaseInvestment)
            .count();

        let average_confidence = if total_events == 0 {
            0.0
        } else {
            analyses.iter().map(|a| a.verdict.confidence).sum::<f64>() / total_events as f64
        };

        let dates = analyses.iter().map(|a| a.event_study.event_date);
        let time_range = match (dates.clone().min(), dates.max()) {
            (Some(from), Some(to)) => Some(TimeRange { from, to }),
            _ => None,
        };

        Self {
            total_events,
            positive_recommendations,
            average_confidence,
            time_range,
        }
    }
}
