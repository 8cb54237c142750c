use anyhow::{Context, Result};
use std::path::Path;

use super::RawTable;
use crate::error::{CleaningError, CleaningResult};
use crate::models::{Column, Dataset};

/// Parse CSV text (header row required) into a [`RawTable`].
///
/// Cells are trimmed. Rows with a different field count than the header are
/// accepted; missing trailing cells read as empty.
pub fn parse_csv_str(content: &str) -> CleaningResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CleaningError::EmptyUpload);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(CleaningError::EmptyUpload);
    }
    Ok(RawTable::new(headers, rows))
}

/// Read and parse a CSV file.
pub fn parse_csv_file(path: &Path) -> Result<RawTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
    parse_csv_str(&content).with_context(|| format!("Failed to parse CSV file {}", path.display()))
}

/// Serialize a dataset back to CSV with canonical headers
/// (`timestamp,GI,TM,EAC,<extras>`).
pub fn dataset_to_csv(dataset: &Dataset) -> CleaningResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["timestamp".to_string()];
    header.extend([Column::Gi, Column::Tm, Column::Eac].iter().map(|c| c.name().to_string()));
    header.extend(dataset.extra_columns().iter().cloned());
    writer.write_record(&header)?;

    for record in dataset.records() {
        let mut row = vec![
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.gi.to_string(),
            record.tm.to_string(),
            record.eac.to_string(),
        ];
        row.extend(record.extra.iter().map(f64::to_string));
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CleaningError::Parse(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CleaningError::Parse(e.to_string()))
}
