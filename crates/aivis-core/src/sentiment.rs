//! Sentiment labels assigned to brand mentions and their scoring weights.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Weight used for a brand that has mentions but none classified yet.
pub const UNCLASSIFIED_SENTIMENT_WEIGHT: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Multiplier applied by the sentiment factor of the visibility score.
    ///
    /// The theoretical raw-score maximum is `1.0 * 1.0 * 1.2 * 1.0 = 1.2`.
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            SentimentLabel::VeryPositive => 1.2,
            SentimentLabel::Positive => 1.0,
            SentimentLabel::Neutral => 0.8,
            SentimentLabel::Negative => 0.4,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::VeryPositive => "very_positive",
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "very_positive" => Ok(SentimentLabel::VeryPositive),
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            _ => Err(CoreError::InvalidSentiment(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_table() {
        assert!((SentimentLabel::VeryPositive.weight() - 1.2).abs() < f64::EPSILON);
        assert!((SentimentLabel::Positive.weight() - 1.0).abs() < f64::EPSILON);
        assert!((SentimentLabel::Neutral.weight() - 0.8).abs() < f64::EPSILON);
        assert!((SentimentLabel::Negative.weight() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn unclassified_default_matches_neutral() {
        assert!(
            (UNCLASSIFIED_SENTIMENT_WEIGHT - SentimentLabel::Neutral.weight()).abs() < f64::EPSILON
        );
    }

    #[test]
    fn parses_wire_labels() {
        assert_eq!(
            "very_positive".parse::<SentimentLabel>().unwrap(),
            SentimentLabel::VeryPositive
        );
        assert_eq!(
            "Negative".parse::<SentimentLabel>().unwrap(),
            SentimentLabel::Negative
        );
        assert!("mixed".parse::<SentimentLabel>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&SentimentLabel::VeryPositive).unwrap();
        assert_eq!(json, "\"very_positive\"");
    }
}
