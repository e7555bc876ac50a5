//! Spreadsheet export with a trend chart added at the end of a session

use super::{ExportRow, HEADER};
use crate::error::{Result, WatchError};
use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::{Chart, ChartType, Workbook};
use std::path::{Path, PathBuf};

pub const SHEET_NAME: &str = "Prices";

/// Column index of the price values
const PRICE_COL: u16 = 3;

/// Accumulates rows and rewrites the workbook after each cycle.
///
/// The xlsx format has no append mode, so the whole sheet is written each
/// time; the rows themselves only ever grow. An existing workbook is read
/// back first so its rows survive the rewrite.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    path: PathBuf,
    rows: Vec<ExportRow>,
}

impl XlsxExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rows: Vec::new(),
        }
    }

    /// Resume the workbook at `path`, or start from `seed` when there is none.
    ///
    /// A workbook that exists but cannot be read is an error: rewriting it
    /// would drop its rows.
    pub fn open<F>(path: impl Into<PathBuf>, seed: F) -> Result<Self>
    where
        F: FnOnce() -> Vec<ExportRow>,
    {
        let mut exporter = Self::new(path);
        exporter.rows = if exporter.path.exists() {
            let rows = read_sheet(&exporter.path)?;
            tracing::info!(path = %exporter.path.display(), rows = rows.len(), "resuming spreadsheet");
            rows
        } else {
            seed()
        };
        Ok(exporter)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    /// Add a cycle's rows and save
    pub fn append(&mut self, rows: &[ExportRow]) -> Result<()> {
        self.rows.extend_from_slice(rows);
        self.write(false)
    }

    /// Save once more with the line chart inserted at `G2`
    pub fn finalize(&self) -> Result<()> {
        self.write(true)?;
        tracing::info!(path = %self.path.display(), rows = self.rows.len(), "spreadsheet chart written");
        Ok(())
    }

    fn write(&self, with_chart: bool) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, title) in (0u16..).zip(HEADER) {
            worksheet.write_string(0, col, title)?;
        }

        for (row_idx, row) in (1u32..).zip(&self.rows) {
            worksheet.write_string(row_idx, 0, &row.timestamp)?;
            worksheet.write_string(row_idx, 1, &row.symbol)?;
            worksheet.write_string(row_idx, 2, &row.name)?;
            worksheet.write_number(row_idx, PRICE_COL, row.price)?;
        }

        if with_chart && !self.rows.is_empty() {
            let last_row = self.rows.len() as u32;

            let mut chart = Chart::new(ChartType::Line);
            chart.title().set_name("Stock Price Trend");
            chart.x_axis().set_name("Time");
            chart.y_axis().set_name("Price");
            chart
                .add_series()
                .set_name("Price")
                .set_categories((SHEET_NAME, 1, 0, last_row, 0))
                .set_values((SHEET_NAME, 1, PRICE_COL, last_row, PRICE_COL));

            worksheet.insert_chart(1, 6, &chart)?;
        }

        workbook.save(&self.path)?;
        Ok(())
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Data rows of the `Prices` sheet, header skipped
fn read_sheet(path: &Path) -> Result<Vec<ExportRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(SHEET_NAME)?;

    let mut rows = Vec::new();
    for (idx, cells) in range.rows().enumerate().skip(1) {
        if cells.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        let text = |col: usize| cells.get(col).map(ToString::to_string).unwrap_or_default();
        let price = cells
            .get(usize::from(PRICE_COL))
            .and_then(cell_number)
            .ok_or_else(|| {
                WatchError::Other(format!(
                    "{}: row {} has no numeric price",
                    path.display(),
                    idx + 1
                ))
            })?;

        rows.push(ExportRow {
            timestamp: text(0),
            symbol: text(1),
            name: text(2),
            price,
        });
    }
    Ok(rows)
}
