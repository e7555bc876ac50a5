//! Buy / Sell / Hold hint from headline sentiment and price bands

use crate::alert::PriceBand;
use std::fmt;

/// Sentiment above this (or below its negation) is strong enough to act on
pub const ACTION_SENTIMENT_CUTOFF: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// Classify a quote. Without a band, max is +inf and min is -inf.
    pub fn classify(price: f64, sentiment: f64, band: Option<&PriceBand>) -> Self {
        let max = band.map_or(f64::INFINITY, |b| b.max);
        let min = band.map_or(f64::NEG_INFINITY, |b| b.min);

        if sentiment > ACTION_SENTIMENT_CUTOFF && price < max {
            Action::Buy
        } else if sentiment < -ACTION_SENTIMENT_CUTOFF && price > min {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "🟢 Buy"),
            Action::Sell => write!(f, "🔴 Sell"),
            Action::Hold => write!(f, "🟡 Hold"),
        }
    }
}
