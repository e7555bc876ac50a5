//! Last-seen price per symbol, used for the change column

use std::collections::HashMap;
use std::fmt;

/// Direction of a price move between two cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
    /// First observation for the symbol
    New,
}

/// Change against the previous cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub previous: Option<f64>,
    pub current: f64,
}

impl PriceChange {
    pub fn delta(&self) -> Option<f64> {
        self.previous.map(|previous| self.current - previous)
    }

    pub fn direction(&self) -> Direction {
        match self.delta() {
            None => Direction::New,
            Some(d) if d > 0.0 => Direction::Up,
            Some(d) if d < 0.0 => Direction::Down,
            Some(_) => Direction::Flat,
        }
    }
}

impl fmt::Display for PriceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.direction(), self.delta()) {
            (Direction::Up, Some(d)) => write!(f, "▲ +{d:.2}"),
            (Direction::Down, Some(d)) => write!(f, "▼ {d:.2}"),
            (Direction::Flat, _) => write!(f, "= 0.00"),
            _ => write!(f, "–"),
        }
    }
}

/// Symbol -> last observed price, process lifetime only
#[derive(Debug, Clone, Default)]
pub struct PreviousPrices {
    prices: HashMap<String, f64>,
}

impl PreviousPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    /// Record `price` and report the change against the stored value
    pub fn observe(&mut self, symbol: &str, price: f64) -> PriceChange {
        let previous = self.prices.insert(symbol.to_string(), price);
        PriceChange {
            previous,
            current: price,
        }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
