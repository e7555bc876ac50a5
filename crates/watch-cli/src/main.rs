//! Stock Watch CLI
//!
//! Polls prices for a list of symbols and redraws a table every interval.
//!
//! # Usage
//!
//! ```bash
//! # Prompt for symbols and interval
//! cargo run --bin stock-watch
//!
//! # Non-interactive
//! cargo run --bin stock-watch -- --symbols AAPL,MSFT --interval 15 --no-email
//! ```

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use stock_watch::input::{IntervalChoice, parse_symbols, prompt_interval, prompt_symbols};
use stock_watch::{WatchConfig, WatchSession};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-watch")]
#[command(about = "Watch stock prices in the terminal", long_about = None)]
struct Args {
    /// Comma separated symbols; prompts when omitted
    #[arg(short, long)]
    symbols: Option<String>,

    /// Refresh interval in seconds; prompts when omitted
    #[arg(short, long)]
    interval: Option<String>,

    /// CSV ledger path
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Spreadsheet path
    #[arg(long, conflicts_with = "no_xlsx")]
    xlsx: Option<PathBuf>,

    /// Skip spreadsheet export
    #[arg(long)]
    no_xlsx: bool,

    /// Skip headline scraping and sentiment
    #[arg(long)]
    no_sentiment: bool,

    /// Skip the summary email even when SMTP is configured
    #[arg(long)]
    no_email: bool,
}

fn build_config(args: &Args) -> anyhow::Result<WatchConfig> {
    let mut builder = WatchConfig::builder().with_env();

    if let Some(path) = &args.csv {
        builder = builder.csv_path(path);
    }
    if let Some(path) = &args.xlsx {
        builder = builder.xlsx_path(path);
    }
    if args.no_xlsx {
        builder = builder.no_xlsx();
    }
    if args.no_sentiment {
        builder = builder.sentiment_enabled(false);
    }

    let mut config = builder.build()?;
    if args.no_email {
        config.email = None;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    watch_utils::init_tracing_with("warn,stock_watch=info");

    let args = Args::parse();
    let config = build_config(&args)?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let symbols = match &args.symbols {
        Some(raw) => parse_symbols(raw, &config.default_symbols),
        None => prompt_symbols(&mut input, &mut output, &config.default_symbols)?,
    };

    let interval = match &args.interval {
        Some(raw) => {
            let choice = IntervalChoice::resolve(raw, config.refresh_interval);
            if let Some(warning) = choice.warning() {
                tracing::warn!(input = %raw, "invalid refresh interval, using default");
                writeln!(output, "{warning}")?;
            }
            choice.interval
        },
        None => prompt_interval(&mut input, &mut output, config.refresh_interval)?,
    };
    drop(input);

    info!(symbols = ?symbols, interval_secs = interval.as_secs(), "Starting stock-watch");

    let session = WatchSession::from_config(&config, symbols, interval)?;
    session
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
