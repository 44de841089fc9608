use std::{fmt, io::Write, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use csv::Writer;

use duebook_domain::Transaction;

use crate::errors::{AppError, AppResult};

/// Byte-order mark so spreadsheet tools pick UTF-8 for non-Latin text.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const EMPTY_CELL: &str = "-";
const HEADERS: [&str; 5] = ["date", "kind", "amount", "description", "due_date"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(AppError::InvalidInput(format!(
                "unsupported export format `{other}` (use csv or json)"
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Writes the transactions as CSV, one row per entry in the given order.
pub fn write_transactions_csv<W: Write>(
    mut output: W,
    transactions: &[&Transaction],
) -> AppResult<()> {
    output.write_all(UTF8_BOM)?;
    let mut writer = Writer::from_writer(output);
    writer.write_record(HEADERS)?;
    for txn in transactions {
        writer.write_record([
            iso_day(txn.occurred_at),
            txn.kind.to_string(),
            txn.amount.to_string(),
            txn.description
                .as_deref()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or(EMPTY_CELL)
                .to_string(),
            txn.due_date
                .map(iso_day)
                .unwrap_or_else(|| EMPTY_CELL.to_string()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the transactions as a pretty JSON array.
pub fn write_transactions_json<W: Write>(
    output: W,
    transactions: &[&Transaction],
) -> AppResult<()> {
    serde_json::to_writer_pretty(output, transactions)?;
    Ok(())
}

/// Default file name for a client's history export.
pub fn export_file_name(client_name: &str, today: NaiveDate, format: ExportFormat) -> String {
    let slug: String = client_name
        .trim()
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { '_' })
        .collect();
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { "client" } else { slug };
    format!(
        "transactions_{}_{}.{}",
        slug,
        today.format("%Y-%m-%d"),
        format.extension()
    )
}

fn iso_day(at: DateTime<Utc>) -> String {
    at.date_naive().format("%Y-%m-%d").to_string()
}
