//! Headline sentiment scoring

use std::fmt;

/// Scores free text into a compound polarity in `[-1, 1]`
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

/// VADER lexicon scorer, compound score only
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderScorer;

impl SentimentScorer for VaderScorer {
    fn score(&self, text: &str) -> f64 {
        let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
        analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

/// Coarse reading of a sentiment score for the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Positive,
    Neutral,
    Negative,
}

impl Mood {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.2 {
            Mood::Positive
        } else if score <= -0.2 {
            Mood::Negative
        } else {
            Mood::Neutral
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self {
            Mood::Positive => "🟢",
            Mood::Neutral => "🟡",
            Mood::Negative => "🔴",
        };
        f.write_str(marker)
    }
}
