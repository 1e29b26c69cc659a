use serde::Serialize;
use tracing::{debug, instrument};

use crate::ledger::YearColumn;
use crate::scrape_error::ScrapeError;

/// One OFO event as written to the CSV export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfoRecord {
    #[serde(rename = "Stage")]
    pub stage: String,
    #[serde(rename = "Percent")]
    pub percent: String,
    #[serde(rename = "Date")]
    pub date: String,
}

/// A ledger value split into its three comma-separated fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry<'a> {
    pub month_day: &'a str,
    pub stage: &'a str,
    pub percent: &'a str,
}

/// Split `value` into exactly `month_day,stage,percent`
pub fn split_entry(row: usize, value: &str) -> Result<LedgerEntry<'_>, ScrapeError> {
    let parts: Vec<&str> = value.split(',').collect();
    match parts.as_slice() {
        &[month_day, stage, percent] => Ok(LedgerEntry {
            month_day,
            stage,
            percent,
        }),
        _ => Err(ScrapeError::MalformedRow {
            row,
            value: value.to_string(),
            fields: parts.len(),
        }),
    }
}

/// Turn the current year column into dated OFO records.
///
/// Empty values are placeholders and are dropped before splitting, as are
/// entries with no month/day (calendar slots with no event).
#[instrument(skip(column), fields(year = %column.year, values = column.values.len()))]
pub fn reshape(column: &YearColumn) -> Result<Vec<OfoRecord>, ScrapeError> {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (row, value) in column.values.iter().enumerate() {
        if value.is_empty() {
            skipped += 1;
            continue;
        }

        let entry = split_entry(row, value)?;
        if entry.month_day.is_empty() {
            skipped += 1;
            continue;
        }

        records.push(OfoRecord {
            stage: entry.stage.to_string(),
            percent: entry.percent.to_string(),
            date: format!("{}, {}", entry.month_day, column.year),
        });
    }

    debug!(
        "Reshaped {} records, skipped {} empty slots",
        records.len(),
        skipped
    );
    Ok(records)
}
