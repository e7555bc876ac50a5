//! Flat-file exporters for fetched quotes

pub mod csv;
pub mod xlsx;

pub use self::csv::CsvExporter;
pub use self::xlsx::XlsxExporter;

use crate::api::Quote;
use serde::{Deserialize, Serialize};

/// Column titles shared by the CSV ledger and the spreadsheet
pub const HEADER: [&str; 4] = ["Timestamp", "Symbol", "Name", "Price"];

/// Timestamp layout used in exported rows and the table title
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One exported line: `(Timestamp, Symbol, Name, Price)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Price")]
    pub price: f64,
}

impl ExportRow {
    /// Row for `quote`, stamped with the cycle timestamp rather than the
    /// individual fetch time so one cycle shares one timestamp
    pub fn from_quote(timestamp: &str, quote: &Quote) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            symbol: quote.symbol.clone(),
            name: quote.name.clone(),
            price: quote.price,
        }
    }
}
