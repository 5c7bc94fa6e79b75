use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::alpha_vantage::{NewsItem, SentimentLabel};

/// Aggregate news sentiment for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSentimentSummary {
    pub ticker: String,
    pub article_count: usize,
    /// Mean score in [-1, 1]; 0 when there are no articles
    pub average_score: f64,
    pub label: SentimentLabel,
    pub label_counts: BTreeMap<SentimentLabel, usize>,
}

/// Average the sentiment of `feed` toward `ticker`.
///
/// Uses the ticker-specific score when the article carries one, the overall
/// article score otherwise.
pub fn summarize_news(ticker: &str, feed: &[NewsItem]) -> NewsSentimentSummary {
    let scores: Vec<f64> = feed
        .iter()
        .map(|item| {
            item.sentiment_for(ticker)
                .map(|t| t.ticker_sentiment_score)
                .unwrap_or(item.overall_sentiment_score)
        })
        .filter(|score| score.is_finite())
        .collect();

    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let mut label_counts = BTreeMap::new();
    for score in &scores {
        *label_counts.entry(SentimentLabel::from_score(*score)).or_insert(0) += 1;
    }

    tracing::debug!(
        ticker,
        articles = scores.len(),
        average_score,
        "Summarized news sentiment"
    );

    NewsSentimentSummary {
        ticker: ticker.to_uppercase(),
        article_count: scores.len(),
        average_score,
        label: SentimentLabel::from_score(average_score),
        label_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::alpha_vantage::TickerSentiment;
    use approx::assert_abs_diff_eq;

    fn article(overall: f64, ticker_score: Option<(&str, f64)>) -> NewsItem {
        NewsItem {
            title: "headline".to_string(),
            url: "https://example.com".to_string(),
            time_published: "20240301T120000".to_string(),
            authors: vec![],
            summary: String::new(),
            source: "wire".to_string(),
            category_within_source: String::new(),
            overall_sentiment_score: overall,
            overall_sentiment_label: SentimentLabel::from_score(overall),
            ticker_sentiment: ticker_score
                .map(|(ticker, score)| {
                    vec![TickerSentiment {
                        ticker: ticker.to_string(),
                        relevance_score: 0.8,
                        ticker_sentiment_score: score,
                        ticker_sentiment_label: SentimentLabel::from_score(score).as_str().to_string(),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    #[test]
    fn test_prefers_ticker_specific_score() {
        let feed = vec![
            article(0.0, Some(("AAPL", 0.6))),
            article(0.2, None),
            article(-0.1, Some(("MSFT", -0.9))),
        ];

        let summary = summarize_news("aapl", &feed);
        assert_eq!(summary.ticker, "AAPL");
        assert_eq!(summary.article_count, 3);
        assert_abs_diff_eq!(summary.average_score, (0.6 + 0.2 - 0.1) / 3.0, epsilon = 1e-12);
        assert_eq!(summary.label, SentimentLabel::SomewhatBullish);
        assert_eq!(summary.label_counts.get(&SentimentLabel::Bullish), Some(&1));
        assert_eq!(summary.label_counts.get(&SentimentLabel::Neutral), Some(&1));
    }

    #[test]
    fn test_empty_feed_is_neutral() {
        let summary = summarize_news("TSLA", &[]);
        assert_eq!(summary.article_count, 0);
        assert_eq!(summary.average_score, 0.0);
        assert_eq!(summary.label, SentimentLabel::Neutral);
        assert!(summary.label_counts.is_empty());
    }
}
