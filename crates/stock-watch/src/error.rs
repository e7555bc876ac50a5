//! Error types for stock watching operations

use thiserror::Error;

/// Stock watcher specific errors
#[derive(Debug, Error)]
pub enum WatchError {
    /// Market-data provider answered with an error payload or status
    #[error("API error: {0}")]
    ApiError(String),

    /// Quote payload had no usable price for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Headline scraping error
    #[error("Headline error: {0}")]
    HeadlineError(String),

    /// CSV export error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Spreadsheet export error
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] rust_xlsxwriter::XlsxError),

    /// Existing workbook could not be read back
    #[error("Spreadsheet read error: {0}")]
    SpreadsheetReadError(#[from] calamine::XlsxError),

    /// Filesystem or terminal error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Email composition or delivery error
    #[error("Email error: {0}")]
    EmailError(String),

    /// Notification delivery error
    #[error("Notification error: {0}")]
    NotificationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

impl From<lettre::error::Error> for WatchError {
    fn from(err: lettre::error::Error) -> Self {
        WatchError::EmailError(err.to_string())
    }
}

impl From<lettre::address::AddressError> for WatchError {
    fn from(err: lettre::address::AddressError) -> Self {
        WatchError::EmailError(format!("invalid address: {err}"))
    }
}

impl From<lettre::transport::smtp::Error> for WatchError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        WatchError::EmailError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        WatchError::Other(format!("background task failed: {err}"))
    }
}
