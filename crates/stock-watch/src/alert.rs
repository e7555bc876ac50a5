//! Static price bands and one-shot threshold alerts

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Open interval a price is expected to stay in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Strictly inside the band. A price sitting on a bound is neither
    /// inside nor outside and leaves alert state untouched.
    pub fn contains(&self, price: f64) -> bool {
        self.min < price && price < self.max
    }
}

/// Symbol -> price band mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    bands: HashMap<String, PriceBand>,
}

impl Default for Thresholds {
    fn default() -> Self {
        let mut thresholds = Self::empty();
        thresholds.insert("AAPL", PriceBand::new(100.0, 150.0));
        thresholds.insert("TSLA", PriceBand::new(150.0, 350.0));
        thresholds.insert("GOOGL", PriceBand::new(100.0, 200.0));
        thresholds
    }
}

impl Thresholds {
    /// No bands at all; nothing will ever alert
    pub fn empty() -> Self {
        Self {
            bands: HashMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: impl Into<String>, band: PriceBand) {
        self.bands.insert(symbol.into().to_uppercase(), band);
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceBand> {
        self.bands.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PriceBand)> {
        self.bands.iter()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Which side of the band was crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    AboveMax,
    BelowMin,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::AboveMax => write!(f, "🔺 ABOVE MAX"),
            AlertKind::BelowMin => write!(f, "🔻 BELOW MIN"),
        }
    }
}

/// Alert fired during a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub symbol: String,
    pub kind: AlertKind,
    pub price: f64,
    pub band: PriceBand,
}

impl AlertEvent {
    pub fn title(&self) -> String {
        format!("{} Price Alert", self.symbol)
    }

    pub fn message(&self) -> String {
        let side = match self.kind {
            AlertKind::AboveMax => "ABOVE MAX",
            AlertKind::BelowMin => "BELOW MIN",
        };
        format!("{} is {side}: ${:.2}", self.symbol, self.price)
    }
}

/// Symbols currently in the "already notified" state
#[derive(Debug, Clone, Default)]
pub struct AlertedSet {
    symbols: HashSet<String>,
}

impl AlertedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Compare `price` against the symbol's band and update the alerted flag.
    ///
    /// Returns an event only on the transition into the alerted state.
    pub fn evaluate(&mut self, thresholds: &Thresholds, symbol: &str, price: f64) -> Option<AlertEvent> {
        let band = *thresholds.get(symbol)?;

        if band.contains(price) {
            self.symbols.remove(symbol);
            return None;
        }

        let kind = if price > band.max {
            AlertKind::AboveMax
        } else if price < band.min {
            AlertKind::BelowMin
        } else {
            return None;
        };

        if !self.symbols.insert(symbol.to_string()) {
            return None;
        }

        tracing::debug!(symbol, price, ?kind, "threshold crossed");
        Some(AlertEvent {
            symbol: symbol.to_string(),
            kind,
            price,
            band,
        })
    }
}
