//! One fetch/evaluate pass over every watched symbol

use crate::action::Action;
use crate::alert::{AlertEvent, AlertedSet, Thresholds};
use crate::api::{Headline, HeadlineAnalyzer, Quote, QuoteSource};
use crate::error::{Result, WatchError};
use crate::export::{ExportRow, TIMESTAMP_FORMAT};
use crate::sentiment::Mood;
use crate::tracker::{PreviousPrices, PriceChange};
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Mutable state carried from one cycle to the next
#[derive(Debug, Clone, Default)]
pub struct WatchState {
    pub previous: PreviousPrices,
    pub alerted: AlertedSet,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A successfully fetched symbol, evaluated against the previous state
#[derive(Debug, Clone)]
pub struct QuoteRow {
    pub quote: Quote,
    pub change: PriceChange,
    /// Only set on the cycle where the alert fired
    pub alert: Option<AlertEvent>,
    pub headline: Option<Headline>,
    pub action: Action,
}

impl QuoteRow {
    pub fn sentiment(&self) -> f64 {
        self.headline.as_ref().map_or(0.0, |h| h.sentiment)
    }

    pub fn mood(&self) -> Mood {
        Mood::from_score(self.sentiment())
    }

    /// `AAPL: Apple Inc., Price=$187.44, Action=🟡 Hold, Sentiment=🟡`
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {}, Price=${:.2}, Action={}, Sentiment={}",
            self.quote.symbol,
            self.quote.name,
            self.quote.price,
            self.action,
            self.mood()
        )
    }
}

/// Result of one symbol within a cycle
#[derive(Debug)]
pub enum CycleRow {
    Quote(Box<QuoteRow>),
    Failed { symbol: String, error: WatchError },
}

impl CycleRow {
    pub fn symbol(&self) -> &str {
        match self {
            CycleRow::Quote(row) => &row.quote.symbol,
            CycleRow::Failed { symbol, .. } => symbol,
        }
    }
}

/// Everything one cycle produced, in input symbol order
#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Local>,
    pub rows: Vec<CycleRow>,
    pub sentiment_enabled: bool,
}

impl CycleReport {
    pub fn timestamp_label(&self) -> String {
        self.started_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn quotes(&self) -> impl Iterator<Item = &QuoteRow> {
        self.rows.iter().filter_map(|row| match row {
            CycleRow::Quote(row) => Some(row.as_ref()),
            CycleRow::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &WatchError)> {
        self.rows.iter().filter_map(|row| match row {
            CycleRow::Failed { symbol, error } => Some((symbol.as_str(), error)),
            CycleRow::Quote(_) => None,
        })
    }

    pub fn alerts(&self) -> impl Iterator<Item = &AlertEvent> {
        self.quotes().filter_map(|row| row.alert.as_ref())
    }

    /// One row per successfully fetched symbol
    pub fn export_rows(&self) -> Vec<ExportRow> {
        let timestamp = self.timestamp_label();
        self.quotes()
            .map(|row| ExportRow::from_quote(&timestamp, &row.quote))
            .collect()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        self.quotes().map(QuoteRow::summary_line).collect()
    }
}

/// Fetches quotes (and optionally headlines) and evaluates them
#[derive(Clone)]
pub struct CycleRunner {
    quotes: Arc<dyn QuoteSource>,
    headlines: Option<HeadlineAnalyzer>,
    thresholds: Thresholds,
    max_concurrency: usize,
}

impl CycleRunner {
    pub fn new(quotes: Arc<dyn QuoteSource>, thresholds: Thresholds) -> Self {
        Self {
            quotes,
            headlines: None,
            thresholds,
            max_concurrency: 1,
        }
    }

    /// Score headlines for every successfully fetched symbol
    pub fn with_headlines(mut self, analyzer: HeadlineAnalyzer) -> Self {
        self.headlines = Some(analyzer);
        self
    }

    /// Fetch up to `limit` symbols at once
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    async fn fetch_one(&self, symbol: &str) -> (Result<Quote>, Option<Headline>) {
        let quote = self.quotes.fetch_quote(symbol).await;

        let headline = match (&quote, &self.headlines) {
            (Ok(_), Some(analyzer)) => Some(analyzer.analyze(symbol).await),
            _ => None,
        };

        (quote, headline)
    }

    /// Run one cycle. A failed symbol becomes a `Failed` row and never
    /// affects the others. `state` is only touched after every fetch is done.
    pub async fn run(&self, symbols: &[String], state: &mut WatchState) -> CycleReport {
        let started_at = Local::now();

        let fetched: Vec<(Result<Quote>, Option<Headline>)> = stream::iter(symbols)
            .map(|symbol| self.fetch_one(symbol))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let rows = symbols
            .iter()
            .zip(fetched)
            .map(|(symbol, (quote, headline))| match quote {
                Ok(quote) => CycleRow::Quote(Box::new(self.evaluate(state, quote, headline))),
                Err(error) => {
                    tracing::warn!(symbol = %symbol, error = %error, "quote fetch failed");
                    CycleRow::Failed {
                        symbol: symbol.clone(),
                        error,
                    }
                },
            })
            .collect();

        CycleReport {
            started_at,
            rows,
            sentiment_enabled: self.headlines.is_some(),
        }
    }

    fn evaluate(&self, state: &mut WatchState, quote: Quote, headline: Option<Headline>) -> QuoteRow {
        let symbol = quote.symbol.as_str();
        let band = self.thresholds.get(symbol);

        let change = state.previous.observe(symbol, quote.price);
        let alert = state.alerted.evaluate(&self.thresholds, symbol, quote.price);
        let sentiment = headline.as_ref().map_or(0.0, |h| h.sentiment);
        let action = Action::classify(quote.price, sentiment, band);

        QuoteRow {
            quote,
            change,
            alert,
            headline,
            action,
        }
    }
}
