//! Table rendering for the live console view

use crate::cycle::{CycleReport, CycleRow, QuoteRow};
use crate::tracker::Direction;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};

/// Headline characters shown before the ellipsis
const NEWS_WIDTH: usize = 60;

/// `$187.44`, keeping extra digits when the provider reports them
pub fn format_price(price: f64) -> String {
    let rounded = (price * 100.0).round() / 100.0;
    if rounded.to_bits() == price.to_bits() {
        format!("${price:.2}")
    } else {
        format!("${price}")
    }
}

pub fn title(report: &CycleReport) -> String {
    format!("📈 Stock Watch | {}", report.timestamp_label())
}

fn header(report: &CycleReport) -> Vec<Cell> {
    let mut names = vec!["Symbol", "Name", "Price", "Change"];
    if report.sentiment_enabled {
        names.push("Action");
    }
    names.push("Alert");
    if report.sentiment_enabled {
        names.push("News");
    }

    names
        .into_iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn quote_cells(row: &QuoteRow, with_news: bool) -> Vec<Cell> {
    let change_color = match row.change.direction() {
        Direction::Up => Color::Green,
        Direction::Down => Color::Red,
        Direction::Flat | Direction::New => Color::Reset,
    };

    let mut cells = vec![
        Cell::new(&row.quote.symbol).add_attribute(Attribute::Bold),
        Cell::new(&row.quote.name),
        Cell::new(format_price(row.quote.price)).set_alignment(CellAlignment::Right),
        Cell::new(row.change.to_string())
            .fg(change_color)
            .set_alignment(CellAlignment::Right),
    ];

    if with_news {
        cells.push(Cell::new(row.action.to_string()).set_alignment(CellAlignment::Center));
    }

    let alert = row.alert.as_ref().map(|a| a.kind.to_string()).unwrap_or_default();
    cells.push(Cell::new(alert).fg(Color::Yellow));

    if with_news {
        let news = row
            .headline
            .as_ref()
            .map(|h| format!("{} {}", row.mood(), h.truncated(NEWS_WIDTH)))
            .unwrap_or_default();
        cells.push(Cell::new(news));
    }

    cells
}

fn failed_cells(symbol: &str, error: &str, with_news: bool) -> Vec<Cell> {
    let mut cells = vec![
        Cell::new(symbol).add_attribute(Attribute::Bold),
        Cell::new("⚠️ Error").fg(Color::Red),
        Cell::new("N/A").set_alignment(CellAlignment::Right),
        Cell::new("–").set_alignment(CellAlignment::Right),
    ];
    // The error text takes the last column: News, or Alert without sentiment
    if with_news {
        cells.push(Cell::new("–").set_alignment(CellAlignment::Center));
        cells.push(Cell::new(""));
    }
    cells.push(Cell::new(error).fg(Color::Red));
    cells
}

/// Build the table for one cycle
pub fn build_table(report: &CycleReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(report));

    for row in &report.rows {
        let cells = match row {
            CycleRow::Quote(row) => quote_cells(row, report.sentiment_enabled),
            CycleRow::Failed { symbol, error } => {
                failed_cells(symbol, &error.to_string(), report.sentiment_enabled)
            },
        };
        table.add_row(cells);
    }

    table
}

/// Redraw the whole screen with the latest table
pub fn draw<W: Write>(out: &mut W, report: &CycleReport) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    writeln!(out, "{}", title(report))?;
    writeln!(out, "{}", build_table(report))?;
    writeln!(out, "Press Ctrl+C to stop.")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::alert::{AlertEvent, AlertKind, PriceBand};
    use crate::api::{Headline, Quote};
    use crate::error::WatchError;
    use crate::tracker::PriceChange;
    use chrono::Local;

    fn quote_row(symbol: &str, previous: Option<f64>, price: f64) -> CycleRow {
        CycleRow::Quote(Box::new(QuoteRow {
            quote: Quote {
                symbol: symbol.to_string(),
                name: format!("{symbol} Inc."),
                price,
                fetched_at: Local::now(),
            },
            change: PriceChange {
                previous,
                current: price,
            },
            alert: None,
            headline: None,
            action: Action::Hold,
        }))
    }

    fn render(report: &CycleReport) -> String {
        let mut table = build_table(report);
        table.force_no_tty();
        table.to_string()
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(187.44), "$187.44");
        assert_eq!(format_price(60.0), "$60.00");
        assert_eq!(format_price(0.123_45), "$0.12345");
    }

    #[test]
    fn test_rows_show_price_change_and_errors() {
        let report = CycleReport {
            started_at: Local::now(),
            rows: vec![
                quote_row("AAPL", Some(150.0), 160.0),
                CycleRow::Failed {
                    symbol: "NOPE".to_string(),
                    error: WatchError::ApiError("Not Found".to_string()),
                },
                quote_row("MSFT", None, 370.12),
            ],
            sentiment_enabled: false,
        };

        let rendered = render(&report);
        assert!(rendered.contains("$160.00"));
        assert!(rendered.contains("▲ +10.00"));
        assert!(rendered.contains("$370.12"));
        assert!(rendered.contains("NOPE"));
        assert!(rendered.contains("API error: Not Found"));
        assert!(!rendered.contains("News"));
    }

    #[test]
    fn test_alert_and_news_columns() {
        let mut row = quote_row("AAPL", Some(140.0), 160.0);
        if let CycleRow::Quote(row) = &mut row {
            row.alert = Some(AlertEvent {
                symbol: "AAPL".to_string(),
                kind: AlertKind::AboveMax,
                price: 160.0,
                band: PriceBand::new(100.0, 150.0),
            });
            row.headline = Some(Headline {
                text: "Apple unveils new product line".to_string(),
                sentiment: 0.6,
            });
            row.action = Action::Buy;
        }

        let report = CycleReport {
            started_at: Local::now(),
            rows: vec![row],
            sentiment_enabled: true,
        };

        let rendered = render(&report);
        assert!(rendered.contains("ABOVE MAX"));
        assert!(rendered.contains("Buy"));
        assert!(rendered.contains("Apple unveils new product line..."));
        assert!(title(&report).starts_with("📈 Stock Watch | "));
    }

    #[test]
    fn test_draw_writes_title_and_table() {
        let report = CycleReport {
            started_at: Local::now(),
            rows: vec![quote_row("KO", None, 60.0)],
            sentiment_enabled: false,
        };

        let mut out = Vec::new();
        draw(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Stock Watch"));
        assert!(text.contains("KO Inc."));
    }
}
