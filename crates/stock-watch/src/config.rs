//! Configuration for the stock watcher

use crate::alert::{PriceBand, Thresholds};
use crate::error::{Result, WatchError};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use watch_utils::{env_bool, env_parse, env_string};

/// Symbols watched when the user does not provide a list
pub const DEFAULT_SYMBOLS: [&str; 20] = [
    "AAPL", "TSLA", "AMZN", "GOOGL", "MSFT", "NVDA", "META", "NFLX", "IBM", "INTC", "BABA", "BA",
    "JPM", "DIS", "ORCL", "PYPL", "ADBE", "PEP", "NKE", "KO",
];

/// Refresh interval used when the user input is missing or invalid
pub const DEFAULT_REFRESH_SECS: u64 = 10;

/// SMTP delivery settings for the end-of-session summary
#[derive(Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl EmailConfig {
    /// Load SMTP settings from `SMTP_*` variables.
    ///
    /// Returns `Ok(None)` when no SMTP variable is set at all, and an error
    /// when only part of the settings is present.
    pub fn from_env() -> Result<Option<Self>> {
        let host = env_string("SMTP_HOST");
        let username = env_string("SMTP_USERNAME");
        let password = env_string("SMTP_PASSWORD");
        let to = env_string("SMTP_TO");

        if host.is_none() && username.is_none() && password.is_none() && to.is_none() {
            return Ok(None);
        }

        let missing = |name: &str| WatchError::ConfigError(format!("{name} must be set to send the summary email"));
        let username = username.ok_or_else(|| missing("SMTP_USERNAME"))?;

        Ok(Some(Self {
            smtp_host: host.ok_or_else(|| missing("SMTP_HOST"))?,
            smtp_port: env_parse("SMTP_PORT").unwrap_or(587),
            password: password.ok_or_else(|| missing("SMTP_PASSWORD"))?,
            from: env_string("SMTP_FROM").unwrap_or_else(|| username.clone()),
            to: to.ok_or_else(|| missing("SMTP_TO"))?,
            username,
        }))
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("smtp_host", &self.smtp_host),
            ("username", &self.username),
            ("from", &self.from),
            ("to", &self.to),
        ] {
            if value.trim().is_empty() {
                return Err(WatchError::ConfigError(format!("email {name} must not be empty")));
            }
        }
        if self.smtp_port == 0 {
            return Err(WatchError::ConfigError("email smtp_port must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Configuration for a watch session
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Symbols used when the user provides none
    pub default_symbols: Vec<String>,

    /// Pause between two fetch cycles
    pub refresh_interval: Duration,

    /// Timeout applied to every market-data request
    pub request_timeout: Duration,

    /// Timeout applied to headline page requests
    pub headline_timeout: Duration,

    /// Maximum number of symbols fetched at the same time
    pub max_concurrency: usize,

    /// Market-data requests allowed per minute
    pub quote_rate_limit: u32,

    /// Base URL of the market-data provider
    pub quote_base_url: String,

    /// Base URL of the finance pages scraped for headlines
    pub headline_base_url: String,

    /// Whether headline sentiment is fetched at all
    pub sentiment_enabled: bool,

    /// How long a scraped headline is reused before scraping again
    pub headline_cache_ttl: Duration,

    /// CSV ledger path
    pub csv_path: PathBuf,

    /// Spreadsheet path, `None` disables spreadsheet export
    pub xlsx_path: Option<PathBuf>,

    /// Static per-symbol price bands
    pub thresholds: Thresholds,

    /// Use the OS notification service in addition to the console
    pub desktop_notifications: bool,

    /// Summary email delivery, `None` disables the email
    pub email: Option<EmailConfig>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            default_symbols: DEFAULT_SYMBOLS.iter().map(|s| (*s).to_string()).collect(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            request_timeout: Duration::from_secs(10),
            headline_timeout: Duration::from_secs(5),
            max_concurrency: 4,
            quote_rate_limit: 120,
            quote_base_url: "https://query1.finance.yahoo.com".to_string(),
            headline_base_url: "https://finance.yahoo.com".to_string(),
            sentiment_enabled: true,
            headline_cache_ttl: Duration::from_secs(300), // 5 minutes
            csv_path: PathBuf::from("stock-market-prices.csv"),
            xlsx_path: Some(PathBuf::from("stock_prices.xlsx")),
            thresholds: Thresholds::default(),
            desktop_notifications: false,
            email: None,
        }
    }
}

impl WatchConfig {
    /// Create a new configuration builder
    pub fn builder() -> WatchConfigBuilder {
        WatchConfigBuilder::default()
    }

    /// Defaults overridden by `STOCK_WATCH_*` and `SMTP_*` variables
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env().build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            return Err(WatchError::ConfigError(
                "refresh_interval must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrency == 0 {
            return Err(WatchError::ConfigError(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.quote_rate_limit == 0 {
            return Err(WatchError::ConfigError(
                "quote_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.default_symbols.is_empty() {
            return Err(WatchError::ConfigError(
                "default_symbols must not be empty".to_string(),
            ));
        }

        self.thresholds.validate()?;

        if let Some(email) = &self.email {
            email.validate()?;
        }

        Ok(())
    }
}

/// Builder for WatchConfig
#[derive(Debug, Default)]
pub struct WatchConfigBuilder {
    default_symbols: Option<Vec<String>>,
    refresh_interval: Option<Duration>,
    request_timeout: Option<Duration>,
    headline_timeout: Option<Duration>,
    max_concurrency: Option<usize>,
    quote_rate_limit: Option<u32>,
    quote_base_url: Option<String>,
    headline_base_url: Option<String>,
    sentiment_enabled: Option<bool>,
    headline_cache_ttl: Option<Duration>,
    csv_path: Option<PathBuf>,
    xlsx_path: Option<Option<PathBuf>>,
    thresholds: Option<Thresholds>,
    desktop_notifications: Option<bool>,
    email: Option<EmailConfig>,
    email_from_env: bool,
}

impl WatchConfigBuilder {
    /// Set the fallback symbol list
    pub fn default_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    /// Set the refresh interval
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Set the market-data request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the headline request timeout
    pub fn headline_timeout(mut self, timeout: Duration) -> Self {
        self.headline_timeout = Some(timeout);
        self
    }

    /// Set the number of concurrent symbol fetches
    pub fn max_concurrency(mut self, concurrency: usize) -> Self {
        self.max_concurrency = Some(concurrency);
        self
    }

    /// Set market-data requests per minute
    pub fn quote_rate_limit(mut self, per_minute: u32) -> Self {
        self.quote_rate_limit = Some(per_minute);
        self
    }

    /// Point the quote client at another host
    pub fn quote_base_url(mut self, url: impl Into<String>) -> Self {
        self.quote_base_url = Some(url.into());
        self
    }

    /// Point the headline scraper at another host
    pub fn headline_base_url(mut self, url: impl Into<String>) -> Self {
        self.headline_base_url = Some(url.into());
        self
    }

    /// Enable or disable headline sentiment
    pub fn sentiment_enabled(mut self, enabled: bool) -> Self {
        self.sentiment_enabled = Some(enabled);
        self
    }

    /// Set how long scraped headlines are reused
    pub fn headline_cache_ttl(mut self, ttl: Duration) -> Self {
        self.headline_cache_ttl = Some(ttl);
        self
    }

    /// Set the CSV ledger path
    pub fn csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv_path = Some(path.into());
        self
    }

    /// Set the spreadsheet path
    pub fn xlsx_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.xlsx_path = Some(Some(path.into()));
        self
    }

    /// Disable spreadsheet export
    pub fn no_xlsx(mut self) -> Self {
        self.xlsx_path = Some(None);
        self
    }

    /// Replace the price bands
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Enable OS desktop notifications
    pub fn desktop_notifications(mut self, enabled: bool) -> Self {
        self.desktop_notifications = Some(enabled);
        self
    }

    /// Set SMTP settings for the summary email
    pub fn email(mut self, email: EmailConfig) -> Self {
        self.email = Some(email);
        self
    }

    /// Layer `STOCK_WATCH_*` and `SMTP_*` environment variables over the builder
    pub fn with_env(mut self) -> Self {
        if let Some(path) = env_string("STOCK_WATCH_CSV") {
            self.csv_path = Some(PathBuf::from(path));
        }
        if let Ok(raw) = std::env::var("STOCK_WATCH_XLSX") {
            let raw = raw.trim();
            self.xlsx_path = Some((!raw.is_empty()).then(|| PathBuf::from(raw)));
        }
        if let Some(secs) = env_parse::<u64>("STOCK_WATCH_TIMEOUT_SECS") {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(concurrency) = env_parse::<usize>("STOCK_WATCH_CONCURRENCY") {
            self.max_concurrency = Some(concurrency);
        }
        if let Some(enabled) = env_bool("STOCK_WATCH_SENTIMENT") {
            self.sentiment_enabled = Some(enabled);
        }
        if let Some(enabled) = env_bool("STOCK_WATCH_DESKTOP_NOTIFY") {
            self.desktop_notifications = Some(enabled);
        }
        self.email_from_env = true;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<WatchConfig> {
        let defaults = WatchConfig::default();

        let email = match self.email {
            Some(email) => Some(email),
            None if self.email_from_env => EmailConfig::from_env()?,
            None => None,
        };

        let config = WatchConfig {
            default_symbols: self.default_symbols.unwrap_or(defaults.default_symbols),
            refresh_interval: self.refresh_interval.unwrap_or(defaults.refresh_interval),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            headline_timeout: self.headline_timeout.unwrap_or(defaults.headline_timeout),
            max_concurrency: self.max_concurrency.unwrap_or(defaults.max_concurrency),
            quote_rate_limit: self.quote_rate_limit.unwrap_or(defaults.quote_rate_limit),
            quote_base_url: self.quote_base_url.unwrap_or(defaults.quote_base_url),
            headline_base_url: self.headline_base_url.unwrap_or(defaults.headline_base_url),
            sentiment_enabled: self.sentiment_enabled.unwrap_or(defaults.sentiment_enabled),
            headline_cache_ttl: self.headline_cache_ttl.unwrap_or(defaults.headline_cache_ttl),
            csv_path: self.csv_path.unwrap_or(defaults.csv_path),
            xlsx_path: self.xlsx_path.unwrap_or(defaults.xlsx_path),
            thresholds: self.thresholds.unwrap_or(defaults.thresholds),
            desktop_notifications: self
                .desktop_notifications
                .unwrap_or(defaults.desktop_notifications),
            email,
        };

        config.validate()?;
        Ok(config)
    }
}

impl Thresholds {
    /// Every band must have `min < max`
    pub fn validate(&self) -> Result<()> {
        for (symbol, band) in self.iter() {
            let PriceBand { min, max } = *band;
            if min.is_nan() || max.is_nan() || min >= max {
                return Err(WatchError::ConfigError(format!(
                    "threshold for {symbol} must satisfy min < max (got {min} / {max})"
                )));
            }
        }
        Ok(())
    }
}
