//! Sentiment-impact classification
//!
//! Turns a news sentiment score and a price change into an investment signal.

use serde::{Deserialize, Serialize};

/// Whether price moved with or against sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correlation {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    IncreaseInvestment,
    Hold,
    Caution,
}

impl Correlation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Correlation::Positive => "positive",
            Correlation::Negative => "negative",
            Correlation::Neutral => "neutral",
        }
    }
}

impl Strength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Moderate => "moderate",
            Strength::Strong => "strong",
        }
    }
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::IncreaseInvestment => "increase_investment",
            Recommendation::Hold => "hold",
            Recommendation::Caution => "caution",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentImpact {
    pub correlation: Correlation,
    pub strength: Strength,
    pub recommendation: Recommendation,
    /// 0-100
    pub confidence: f64,
}

/// Classify how a sentiment score relates to a price change.
///
/// # Arguments
/// * `sentiment_score` - aggregate news sentiment, conventionally in [-1, 1]
/// * `price_change` - percent move, e.g. `2.5` for +2.5%
///
/// Inputs are not range-checked.
pub fn classify_sentiment_impact(sentiment_score: f64, price_change: f64) -> SentimentImpact {
    let abs_correlation = (sentiment_score * price_change).abs();

    let bullish = sentiment_score > 0.1;
    let bearish = sentiment_score < -0.1;

    let correlation = if (bullish && price_change > 0.0) || (bearish && price_change < 0.0) {
        Correlation::Positive
    } else if (bullish && price_change < 0.0) || (bearish && price_change > 0.0) {
        Correlation::Negative
    } else {
        Correlation::Neutral
    };

    let strength = if abs_correlation > 15.0 {
        Strength::Strong
    } else if abs_correlation > 5.0 {
        Strength::Moderate
    } else {
        Strength::Weak
    };

    // f64::min ignores a NaN operand, so confidence falls back to the cap
    let (recommendation, confidence) = if sentiment_score > 0.3 && price_change > 2.0 {
        (Recommendation::IncreaseInvestment, 95.0_f64.min(60.0 + abs_correlation * 2.0))
    } else if sentiment_score < -0.3 && price_change < -2.0 {
        (Recommendation::Caution, 90.0_f64.min(50.0 + abs_correlation * 2.0))
    } else {
        (Recommendation::Hold, 80.0_f64.min(40.0 + abs_correlation))
    };

    SentimentImpact {
        correlation,
        strength,
        recommendation,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_bullish_alignment() {
        let impact = classify_sentiment_impact(0.5, 3.0);

        assert_eq!(impact.correlation, Correlation::Positive);
        assert_eq!(impact.strength, Strength::Weak);
        assert_eq!(impact.recommendation, Recommendation::IncreaseInvestment);
        assert_abs_diff_eq!(impact.confidence, 63.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearish_alignment() {
        let impact = classify_sentiment_impact(-0.5, -5.0);

        assert_eq!(impact.correlation, Correlation::Positive);
        assert_eq!(impact.recommendation, Recommendation::Caution);
        assert_abs_diff_eq!(impact.confidence, 55.0, epsilon = 1e-9);
    }

    #[test]
    fn test_divergence_is_negative_correlation() {
        assert_eq!(classify_sentiment_impact(0.2, -1.0).correlation, Correlation::Negative);
        assert_eq!(classify_sentiment_impact(-0.2, 1.0).correlation, Correlation::Negative);
        assert_eq!(classify_sentiment_impact(0.1, 5.0).correlation, Correlation::Neutral);
        assert_eq!(classify_sentiment_impact(0.5, 0.0).correlation, Correlation::Neutral);
    }

    #[test]
    fn test_strength_thresholds() {
        // |score * change| of exactly 5 and 15 stay in the lower band
        assert_eq!(classify_sentiment_impact(1.0, 5.0).strength, Strength::Weak);
        assert_eq!(classify_sentiment_impact(1.0, 5.5).strength, Strength::Moderate);
        assert_eq!(classify_sentiment_impact(1.0, 15.0).strength, Strength::Moderate);
        assert_eq!(classify_sentiment_impact(-1.0, 20.0).strength, Strength::Strong);
    }

    #[test]
    fn test_confidence_caps() {
        assert_abs_diff_eq!(classify_sentiment_impact(1.0, 50.0).confidence, 95.0);
        assert_abs_diff_eq!(classify_sentiment_impact(-1.0, -50.0).confidence, 90.0);
        assert_abs_diff_eq!(classify_sentiment_impact(0.0, 100.0).confidence, 40.0);
        assert_abs_diff_eq!(classify_sentiment_impact(0.2, 100.0).confidence, 60.0);
        assert_abs_diff_eq!(classify_sentiment_impact(1.0, -100.0).confidence, 80.0);
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_value(classify_sentiment_impact(0.5, 3.0)).unwrap();
        assert_eq!(json["correlation"], "positive");
        assert_eq!(json["strength"], "weak");
        assert_eq!(json["recommendation"], "increase_investment");
        assert_eq!(Recommendation::Caution.to_string(), "caution");
    }
}
