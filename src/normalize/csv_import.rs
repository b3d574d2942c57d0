//! Tier tables from supplier CSV price sheets.
//!
//! The header row is matched against the same alias table as JSON input,
//! so a sheet with `desde;hasta;precio` columns imports as-is.

use super::normalize_records;
use crate::domain::TierTable;
use serde_json::{Map, Value};
use std::io::Read;

/// Read a CSV price sheet into a tier table.
///
/// `delimiter` is usually `b','` or `b';'` (spreadsheets in comma-decimal
/// locales export semicolons).
///
/// # Errors
/// Returns an error only when the CSV itself cannot be read. Rows that do
/// not describe a valid tier are dropped like any other malformed input.
pub fn tiers_from_csv<R: Read>(reader: R, delimiter: u8) -> Result<TierTable, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let record: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), Value::String(v.to_string())))
            .collect();
        records.push(Value::Object(record));
    }

    Ok(normalize_records(&records))
}
