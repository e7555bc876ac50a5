//! Watch session: the poll loop plus its teardown

use crate::api::{HeadlineAnalyzer, YahooHeadlineClient, YahooQuoteClient};
use crate::cache::HeadlineCache;
use crate::config::WatchConfig;
use crate::cycle::{CycleReport, CycleRunner, WatchState};
use crate::email::SummaryMailer;
use crate::error::Result;
use crate::export::{CsvExporter, XlsxExporter};
use crate::notify::{ConsoleNotifier, Notifier, notifier_for};
use crate::render;
use crate::sentiment::VaderScorer;
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type SharedSpreadsheet = Arc<Mutex<XlsxExporter>>;

/// Run a spreadsheet operation off the runtime; saves rewrite the whole file
async fn on_spreadsheet<F>(xlsx: &SharedSpreadsheet, op: F) -> Result<()>
where
    F: FnOnce(&mut XlsxExporter) -> Result<()> + Send + 'static,
{
    let xlsx = Arc::clone(xlsx);
    tokio::task::spawn_blocking(move || {
        let mut guard = xlsx.blocking_lock();
        op(&mut *guard)
    })
    .await?
}

/// Owns everything that lives for one run of the watcher
pub struct WatchSession {
    symbols: Vec<String>,
    interval: Duration,
    runner: CycleRunner,
    state: WatchState,
    csv: CsvExporter,
    xlsx: Option<SharedSpreadsheet>,
    notifier: Box<dyn Notifier>,
    mailer: Option<SummaryMailer>,
    last_summary: Vec<String>,
}

impl WatchSession {
    pub fn new(symbols: Vec<String>, interval: Duration, runner: CycleRunner, csv: CsvExporter) -> Self {
        Self {
            symbols,
            interval,
            runner,
            state: WatchState::new(),
            csv,
            xlsx: None,
            notifier: Box::new(ConsoleNotifier::default()),
            mailer: None,
            last_summary: Vec::new(),
        }
    }

    /// Wire the Yahoo clients, exporters, notifier and mailer from `config`
    pub fn from_config(config: &WatchConfig, symbols: Vec<String>, interval: Duration) -> Result<Self> {
        let quotes = Arc::new(YahooQuoteClient::new(config)?);
        let mut runner = CycleRunner::new(quotes, config.thresholds.clone())
            .with_concurrency(config.max_concurrency);

        if config.sentiment_enabled {
            let analyzer = HeadlineAnalyzer::new(
                Arc::new(YahooHeadlineClient::new(config)?),
                Arc::new(VaderScorer),
                HeadlineCache::new(config.headline_cache_ttl),
            );
            runner = runner.with_headlines(analyzer);
        }

        let csv = CsvExporter::new(&config.csv_path);
        let mut session = Self::new(symbols, interval, runner, csv).with_notifier(notifier_for(config));

        if let Some(path) = &config.xlsx_path {
            // A new workbook starts from the CSV ledger's history
            let ledger = &session.csv;
            let xlsx = XlsxExporter::open(path, || {
                ledger.read_rows().unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "could not read CSV history for the spreadsheet");
                    Vec::new()
                })
            })?;
            session = session.with_xlsx(xlsx);
        }

        if let Some(email) = &config.email {
            session = session.with_mailer(SummaryMailer::new(email.clone()));
        }

        Ok(session)
    }

    pub fn with_xlsx(mut self, xlsx: XlsxExporter) -> Self {
        self.xlsx = Some(Arc::new(Mutex::new(xlsx)));
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_mailer(mut self, mailer: SummaryMailer) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn last_summary(&self) -> &[String] {
        &self.last_summary
    }

    /// Fetch, evaluate, notify and export once
    pub async fn run_cycle(&mut self) -> CycleReport {
        let report = self.runner.run(&self.symbols, &mut self.state).await;

        for alert in report.alerts() {
            if let Err(e) = self.notifier.notify(alert) {
                tracing::warn!(symbol = %alert.symbol, error = %e, "notification failed");
            }
        }

        let rows = report.export_rows();
        let exported = rows.len();
        if let Err(e) = self.csv.append(&rows) {
            tracing::error!(path = %self.csv.path().display(), error = %e, "CSV export failed");
        }
        self.last_summary = report.summary_lines();

        if let Some(xlsx) = &self.xlsx {
            if let Err(e) = on_spreadsheet(xlsx, move |xlsx| xlsx.append(&rows)).await {
                tracing::error!(error = %e, "spreadsheet export failed");
            }
        }

        tracing::debug!(
            quotes = exported,
            failures = report.failures().count(),
            "cycle complete"
        );
        report
    }

    /// Poll until `shutdown` resolves, drawing on stdout, then tear down.
    pub async fn run<S>(self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        self.run_with_output(shutdown, &mut io::stdout()).await
    }

    /// Like [`run`](Self::run), drawing into `out`.
    ///
    /// Shutdown is honoured during the sleep and during an in-flight fetch;
    /// a cycle interrupted before its export exports nothing.
    pub async fn run_with_output<S, W>(mut self, shutdown: S, out: &mut W) -> Result<()>
    where
        S: Future<Output = ()>,
        W: Write,
    {
        self.csv.init()?;
        tracing::info!(
            symbols = self.symbols.len(),
            interval_secs = self.interval.as_secs(),
            "starting stock watcher"
        );

        tokio::pin!(shutdown);

        loop {
            let report = tokio::select! {
                () = &mut shutdown => break,
                report = self.run_cycle() => report,
            };

            if let Err(e) = render::draw(out, &report) {
                tracing::warn!(error = %e, "failed to draw table");
            }

            tokio::select! {
                () = &mut shutdown => break,
                () = tokio::time::sleep(self.interval) => {},
            }
        }

        if let Err(e) = writeln!(out, "\n⛔ Exiting Stock Watcher...") {
            tracing::warn!(error = %e, "failed to write exit message");
        }
        self.teardown().await;
        Ok(())
    }

    /// Chart the spreadsheet and send the summary; failures are only logged
    pub async fn teardown(&mut self) {
        if let Some(xlsx) = &self.xlsx {
            if let Err(e) = on_spreadsheet(xlsx, |xlsx| xlsx.finalize()).await {
                tracing::error!(error = %e, "chart error");
            }
        }

        match &self.mailer {
            Some(mailer) => {
                if let Err(e) = mailer.send(self.last_summary.clone()).await {
                    tracing::error!(to = %mailer.recipient(), error = %e, "email error");
                }
            },
            None => tracing::info!("no SMTP configuration, skipping summary email"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertKind, PriceBand, Thresholds};
    use crate::api::quotes::MockQuoteSource;
    use crate::api::{Quote, QuoteSource};
    use crate::error::WatchError;
    use crate::export::ExportRow;
    use crate::notify::MockNotifier;
    use chrono::Local;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use tokio_test::assert_ok;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    /// AAPL walks 140 -> 160 -> 170 across calls, MSFT always fails
    fn scripted_source() -> MockQuoteSource {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut source = MockQuoteSource::new();
        source.expect_fetch_quote().returning(move |symbol| {
            if symbol == "MSFT" {
                return Err(WatchError::ApiError("Too Many Requests".to_string()));
            }
            let prices = [140.0, 160.0, 170.0];
            let n = calls.fetch_add(1, Ordering::SeqCst).min(prices.len() - 1);
            Ok(Quote {
                symbol: symbol.to_string(),
                name: "Apple Inc.".to_string(),
                price: prices[n],
                fetched_at: Local::now(),
            })
        });
        source
    }

    fn thresholds() -> Thresholds {
        let mut thresholds = Thresholds::empty();
        thresholds.insert("AAPL", PriceBand::new(100.0, 150.0));
        thresholds
    }

    #[tokio::test]
    async fn test_cycles_export_notify_and_summarize() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("prices.csv");
        let xlsx_path = dir.path().join("prices.xlsx");

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|alert| alert.symbol == "AAPL" && alert.kind == AlertKind::AboveMax)
            .times(1)
            .returning(|_| Ok(()));

        let runner = CycleRunner::new(Arc::new(scripted_source()), thresholds());
        let mut session = WatchSession::new(
            symbols(&["AAPL", "MSFT"]),
            Duration::from_secs(1),
            runner,
            CsvExporter::new(&csv_path),
        )
        .with_xlsx(XlsxExporter::new(&xlsx_path))
        .with_notifier(Box::new(notifier));

        for _ in 0..3 {
            let report = session.run_cycle().await;
            assert_eq!(report.rows.len(), 2);
        }

        // One row per successful symbol per cycle, single header
        let rows = CsvExporter::new(&csv_path).read_rows().unwrap();
        let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![140.0, 160.0, 170.0]);
        assert!(rows.iter().all(|r| r.symbol == "AAPL"));

        assert!(xlsx_path.exists());
        assert_eq!(session.state().previous.get("AAPL"), Some(170.0));
        assert_eq!(session.last_summary().len(), 1);
        assert!(session.last_summary()[0].starts_with("AAPL: Apple Inc., Price=$170.00"));

        session.teardown().await;
    }

    #[tokio::test]
    async fn test_notification_failure_is_not_fatal() {
        let dir = tempdir().unwrap();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .returning(|_| Err(WatchError::NotificationError("no dbus".to_string())));

        let runner = CycleRunner::new(Arc::new(scripted_source()), thresholds());
        let mut session = WatchSession::new(
            symbols(&["AAPL"]),
            Duration::from_secs(1),
            runner,
            CsvExporter::new(dir.path().join("prices.csv")),
        )
        .with_notifier(Box::new(notifier));

        session.run_cycle().await;
        let report = session.run_cycle().await;
        assert_eq!(report.alerts().count(), 1);
        assert_eq!(report.export_rows().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("prices.csv");

        let runner = CycleRunner::new(Arc::new(scripted_source()), Thresholds::empty());
        let session = WatchSession::new(
            symbols(&["AAPL"]),
            Duration::from_secs(3600),
            runner,
            CsvExporter::new(&csv_path),
        )
        .with_notifier(Box::new(ConsoleNotifier::new(false)));

        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        let mut screen = Vec::new();
        assert_ok!(session.run_with_output(shutdown, &mut screen).await);

        // The first cycle ran before the long sleep was interrupted
        let rows = CsvExporter::new(&csv_path).read_rows().unwrap();
        assert_eq!(rows.len(), 1);

        let screen = String::from_utf8(screen).unwrap();
        assert!(screen.contains("Stock Watch"));
        assert!(screen.contains("Exiting Stock Watcher"));
    }

    /// Answers immediately except for `STUCK`, which never comes back in time
    struct StalledSource;

    #[async_trait::async_trait]
    impl QuoteSource for StalledSource {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
            if symbol == "STUCK" {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(Quote {
                symbol: symbol.to_string(),
                name: format!("{symbol} Corp"),
                price: 42.0,
                fetched_at: Local::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_shutdown_during_cycle_exports_nothing() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("prices.csv");

        let runner = CycleRunner::new(Arc::new(StalledSource), Thresholds::empty()).with_concurrency(2);
        let session = WatchSession::new(
            symbols(&["AAPL", "STUCK"]),
            Duration::from_secs(1),
            runner,
            CsvExporter::new(&csv_path),
        )
        .with_notifier(Box::new(ConsoleNotifier::new(false)));

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        let mut screen = Vec::new();
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            session.run_with_output(shutdown, &mut screen),
        )
        .await;

        assert!(finished.is_ok(), "run kept waiting on the stalled fetch");
        assert_ok!(finished.unwrap());

        // Header only: the abandoned cycle wrote no rows
        let rows = CsvExporter::new(&csv_path).read_rows().unwrap();
        assert!(rows.is_empty());
        assert_eq!(std::fs::read_to_string(&csv_path).unwrap().lines().count(), 1);
    }

    fn history_row(i: u32) -> ExportRow {
        ExportRow {
            timestamp: format!("2024-01-02 10:{:02}:00", i % 60),
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            price: 180.0 + f64::from(i),
        }
    }

    #[tokio::test]
    async fn test_from_config_resumes_workbook_with_other_ledger() {
        let dir = tempdir().unwrap();
        let xlsx_path = dir.path().join("stock_prices.xlsx");

        let history: Vec<ExportRow> = (0..40).map(history_row).collect();
        let mut earlier = XlsxExporter::new(&xlsx_path);
        earlier.append(&history).unwrap();

        // Today's ledger is a different, empty file
        let config = WatchConfig::builder()
            .csv_path(dir.path().join("today.csv"))
            .xlsx_path(&xlsx_path)
            .sentiment_enabled(false)
            .build()
            .unwrap();
        let session =
            WatchSession::from_config(&config, symbols(&["AAPL"]), Duration::from_secs(5)).unwrap();

        let xlsx = session.xlsx.as_ref().unwrap();
        assert_eq!(xlsx.lock().await.rows(), history.as_slice());

        on_spreadsheet(xlsx, |xlsx| xlsx.append(&[history_row(99)])).await.unwrap();

        let reread = XlsxExporter::open(&xlsx_path, Vec::new).unwrap();
        assert_eq!(reread.rows().len(), 41);
        assert_eq!(reread.rows()[0], history[0]);
    }

    #[tokio::test]
    async fn test_from_config_rejects_unreadable_workbook() {
        let dir = tempdir().unwrap();
        let xlsx_path = dir.path().join("stock_prices.xlsx");
        std::fs::write(&xlsx_path, b"corrupted").unwrap();

        let config = WatchConfig::builder()
            .csv_path(dir.path().join("prices.csv"))
            .xlsx_path(&xlsx_path)
            .sentiment_enabled(false)
            .build()
            .unwrap();

        assert!(WatchSession::from_config(&config, symbols(&["AAPL"]), Duration::from_secs(5)).is_err());
        assert_eq!(std::fs::read(&xlsx_path).unwrap(), b"corrupted");
    }

    #[tokio::test]
    async fn test_from_config_wires_exporters() {
        let dir = tempdir().unwrap();
        let config = WatchConfig::builder()
            .csv_path(dir.path().join("prices.csv"))
            .xlsx_path(dir.path().join("prices.xlsx"))
            .sentiment_enabled(false)
            .build()
            .unwrap();

        let session =
            WatchSession::from_config(&config, symbols(&["IBM"]), Duration::from_secs(5)).unwrap();
        assert_eq!(session.symbols(), ["IBM".to_string()]);
        assert_eq!(session.interval(), Duration::from_secs(5));
        assert!(session.xlsx.is_some());
        assert!(session.mailer.is_none());
    }
}
