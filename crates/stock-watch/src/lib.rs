//! Console stock-price watcher
//!
//! This crate polls latest prices for a list of ticker symbols on a fixed
//! interval and keeps a live table on the terminal. It includes:
//!
//! - Quote fetching from the Yahoo chart endpoint, rate limited and concurrent
//! - Change tracking against the previous cycle
//! - Static per-symbol price bands with one-shot threshold alerts
//! - Optional headline scraping scored with VADER sentiment
//! - A CSV ledger and an xlsx workbook with a trend chart
//! - A plain-text summary email sent when the session ends
//!
//! # Example
//!
//! ```rust,ignore
//! use stock_watch::{WatchConfig, WatchSession};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = WatchConfig::from_env()?;
//!     let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];
//!
//!     let session = WatchSession::from_config(&config, symbols, Duration::from_secs(10))?;
//!     session
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod alert;
pub mod api;
pub mod cache;
pub mod config;
pub mod cycle;
pub mod email;
pub mod error;
pub mod export;
pub mod input;
pub mod notify;
pub mod render;
pub mod sentiment;
pub mod session;
pub mod tracker;

// Re-export main types for convenience
pub use action::Action;
pub use alert::{AlertEvent, AlertKind, AlertedSet, PriceBand, Thresholds};
pub use api::{Headline, HeadlineAnalyzer, Quote, QuoteSource, YahooHeadlineClient, YahooQuoteClient};
pub use config::{DEFAULT_REFRESH_SECS, DEFAULT_SYMBOLS, EmailConfig, WatchConfig, WatchConfigBuilder};
pub use cycle::{CycleReport, CycleRow, CycleRunner, QuoteRow, WatchState};
pub use error::{Result, WatchError};
pub use export::{CsvExporter, ExportRow, XlsxExporter};
pub use notify::{ConsoleNotifier, Notifier};
pub use session::WatchSession;
pub use tracker::{PreviousPrices, PriceChange};
