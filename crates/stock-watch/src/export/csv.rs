//! Append-only CSV ledger

use super::{ExportRow, HEADER};
use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Appends each cycle's rows to a CSV file, writing the header only once
#[derive(Debug, Clone)]
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with its header unless it already has content
    pub fn init(&self) -> Result<()> {
        let has_content = fs::metadata(&self.path).is_ok_and(|meta| meta.len() > 0);
        if has_content {
            return Ok(());
        }

        let mut wtr = csv::Writer::from_path(&self.path)?;
        wtr.write_record(HEADER)?;
        wtr.flush()?;
        tracing::info!(path = %self.path.display(), "created CSV ledger");
        Ok(())
    }

    /// Append rows; the header is (re)created first if the file vanished
    pub fn append(&self, rows: &[ExportRow]) -> Result<()> {
        self.init()?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// All rows currently in the ledger
    pub fn read_rows(&self) -> Result<Vec<ExportRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = csv::Reader::from_path(&self.path)?;
        let rows = rdr.deserialize().collect::<std::result::Result<Vec<ExportRow>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(timestamp: &str, symbol: &str, price: f64) -> ExportRow {
        ExportRow {
            timestamp: timestamp.to_string(),
            symbol: symbol.to_string(),
            name: format!("{symbol} Inc."),
            price,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let exporter = CsvExporter::new(&path);

        exporter.init().unwrap();
        exporter
            .append(&[row("2024-01-02 10:00:00", "AAPL", 187.44), row("2024-01-02 10:00:00", "MSFT", 370.0)])
            .unwrap();

        // A fresh exporter on the same file behaves like a re-run
        let rerun = CsvExporter::new(&path);
        rerun.init().unwrap();
        rerun.append(&[row("2024-01-02 10:00:10", "AAPL", 188.0)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Timestamp,Symbol,Name,Price");
        assert_eq!(content.matches("Timestamp,Symbol").count(), 1);
        assert_eq!(lines[1], "2024-01-02 10:00:00,AAPL,AAPL Inc.,187.44");
    }

    #[test]
    fn test_existing_file_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, "Timestamp,Symbol,Name,Price\nold,KO,Coca-Cola,60.1\n").unwrap();

        let exporter = CsvExporter::new(&path);
        exporter.init().unwrap();
        exporter.append(&[row("new", "KO", 61.0)]).unwrap();

        let rows = exporter.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, "old");
        assert_eq!(rows[1].price, 61.0);
    }

    #[test]
    fn test_append_recreates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("late.csv");
        let exporter = CsvExporter::new(&path);

        exporter.append(&[row("t", "IBM", 140.5)]).unwrap();

        let rows = exporter.read_rows().unwrap();
        assert_eq!(rows, vec![row("t", "IBM", 140.5)]);
    }

    #[test]
    fn test_names_with_commas_round_trip() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path().join("quoted.csv"));
        let mut tricky = row("t", "BRK-B", 410.0);
        tricky.name = "Berkshire Hathaway, Inc.".to_string();

        exporter.append(std::slice::from_ref(&tricky)).unwrap();
        assert_eq!(exporter.read_rows().unwrap(), vec![tricky]);
    }

    #[test]
    fn test_read_rows_missing_file() {
        let dir = tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path().join("absent.csv"));
        assert!(exporter.read_rows().unwrap().is_empty());
    }
}
