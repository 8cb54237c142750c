//! Column/schema validation for uploaded generation data.
//!
//! Resolves upload headers against the known aliases of every required
//! column, checks that required values are numeric (or compose into a
//! timestamp) and produces a typed [`Dataset`]. The first violation rejects
//! the whole upload with an error naming the offending column.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{CleaningError, CleaningResult, PipelineWarning};
use crate::models::{Column, Dataset, Record};
use crate::parsing::RawTable;

const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "datetime", "date_time", "time"];
const DATE_ALIASES: &[&str] = &["date", "the_date", "day"];
const HOUR_ALIASES: &[&str] = &["hour", "the_hour", "hr"];
const GI_ALIASES: &[&str] = &["gi", "irradiance", "ghi", "global_irradiance"];
const TM_ALIASES: &[&str] = &["tm", "temperature", "temp", "module_temperature"];
const EAC_ALIASES: &[&str] = &["eac", "energy", "ac_energy", "generation"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%dT%H:%M:%S",
    "%Y/%m/%dT%H:%M",
];

/// How record timestamps were derived from the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    #[default]
    Timestamp,
    DateHour,
}

/// Summary statistics computed during validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_rows: usize,
    pub time_source: TimeSource,
    pub zero_gi_rows: usize,
    pub zero_tm_rows: usize,
    pub extra_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
}

/// Outcome of a successful validation: the typed dataset plus what was
/// observed on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    pub dataset: Dataset,
    pub warnings: Vec<PipelineWarning>,
    pub stats: ValidationStats,
}

/// Header positions of the required columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeColumns {
    Timestamp(usize),
    DateHour { date: usize, hour: usize },
}

/// Validator for uploaded generation tables.
///
/// # Examples
///
/// ```
/// use sfp_rust::parsing::parse_csv_str;
/// use sfp_rust::preprocessing::SchemaValidator;
///
/// let table = parse_csv_str("Date,Hour,Irradiance,Temp,Energy\n2024-01-01,10,500,25,40\n").unwrap();
/// let upload = SchemaValidator::validate(&table).unwrap();
/// assert_eq!(upload.dataset.len(), 1);
/// ```
pub struct SchemaValidator;

impl SchemaValidator {
    /// Check `table` without keeping the typed result.
    pub fn check(table: &RawTable) -> CleaningResult<()> {
        Self::validate(table).map(|_| ())
    }

    /// Validate `table` and convert it into a [`Dataset`].
    ///
    /// # Errors
    ///
    /// * [`CleaningError::EmptyUpload`] when the table has no rows
    /// * [`CleaningError::MissingColumn`] naming the first required column
    ///   with no matching header
    /// * [`CleaningError::InvalidDate`] for an unparseable timestamp, date or hour
    /// * [`CleaningError::NonNumericColumn`] naming the column and the first
    ///   offending row (0-based)
    pub fn validate(table: &RawTable) -> CleaningResult<ValidatedUpload> {
        if table.height() == 0 {
            return Err(CleaningError::EmptyUpload);
        }

        let mut used = vec![false; table.headers.len()];
        let time = Self::resolve_time(table, &mut used)?;
        let gi = Self::resolve_required(table, &mut used, GI_ALIASES, Column::Gi)?;
        let tm = Self::resolve_required(table, &mut used, TM_ALIASES, Column::Tm)?;
        let eac = Self::resolve_required(table, &mut used, EAC_ALIASES, Column::Eac)?;

        let mut stats = ValidationStats {
            total_rows: table.height(),
            ..Default::default()
        };
        let mut warnings = Vec::new();

        let timestamps = match time {
            TimeColumns::Timestamp(idx) => {
                stats.time_source = TimeSource::Timestamp;
                Self::parse_timestamps(table, idx)?
            }
            TimeColumns::DateHour { date, hour } => {
                stats.time_source = TimeSource::DateHour;
                Self::compose_date_hour(table, date, hour)?
            }
        };
        let gi_values = Self::parse_numeric(table, gi, Column::Gi.name())?;
        let tm_values = Self::parse_numeric(table, tm, Column::Tm.name())?;
        let eac_values = Self::parse_numeric(table, eac, Column::Eac.name())?;

        // Remaining columns: keep the fully numeric ones.
        let mut extras: Vec<(String, Vec<f64>)> = Vec::new();
        for (idx, header) in table.headers.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let name = header.trim();
            let reserved = is_reserved(name) || extras.iter().any(|(n, _)| n == name);
            match Self::parse_numeric(table, idx, name) {
                Ok(values) if !name.is_empty() && !reserved => {
                    extras.push((name.to_string(), values));
                }
                _ => {
                    stats.dropped_columns.push(name.to_string());
                    warnings.push(PipelineWarning::DroppedColumn {
                        column: name.to_string(),
                    });
                }
            }
        }

        let records: Vec<Record> = (0..table.height())
            .map(|row| Record {
                timestamp: timestamps[row],
                gi: gi_values[row],
                tm: tm_values[row],
                eac: eac_values[row],
                extra: extras.iter().map(|(_, values)| values[row]).collect(),
            })
            .collect();

        stats.zero_gi_rows = records.iter().filter(|r| r.gi == 0.0).count();
        stats.zero_tm_rows = records.iter().filter(|r| r.tm == 0.0).count();
        stats.extra_columns = extras.iter().map(|(name, _)| name.clone()).collect();

        log::debug!(
            "Validated upload: {} rows, {} extra columns, {} dropped",
            stats.total_rows,
            stats.extra_columns.len(),
            stats.dropped_columns.len()
        );

        Ok(ValidatedUpload {
            dataset: Dataset::new(stats.extra_columns.clone(), records),
            warnings,
            stats,
        })
    }

    fn resolve_time(table: &RawTable, used: &mut [bool]) -> CleaningResult<TimeColumns> {
        if let Some(idx) = find_alias(table, used, TIMESTAMP_ALIASES) {
            used[idx] = true;
            // A timestamp wins; date/hour columns next to it are redundant.
            for aliases in [DATE_ALIASES, HOUR_ALIASES] {
                if let Some(extra) = find_alias(table, used, aliases) {
                    used[extra] = true;
                }
            }
            return Ok(TimeColumns::Timestamp(idx));
        }

        let date = find_alias(table, used, DATE_ALIASES).ok_or_else(|| CleaningError::MissingColumn {
            column: "timestamp or date".to_string(),
        })?;
        used[date] = true;
        let hour = find_alias(table, used, HOUR_ALIASES).ok_or_else(|| CleaningError::MissingColumn {
            column: "hour".to_string(),
        })?;
        used[hour] = true;
        Ok(TimeColumns::DateHour { date, hour })
    }

    fn resolve_required(
        table: &RawTable,
        used: &mut [bool],
        aliases: &[&str],
        column: Column,
    ) -> CleaningResult<usize> {
        let idx = find_alias(table, used, aliases).ok_or_else(|| CleaningError::MissingColumn {
            column: column.name().to_string(),
        })?;
        used[idx] = true;
        Ok(idx)
    }

    fn parse_numeric(table: &RawTable, col: usize, name: &str) -> CleaningResult<Vec<f64>> {
        (0..table.height())
            .map(|row| {
                let cell = table.cell(row, col);
                cell.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| CleaningError::NonNumericColumn {
                        column: name.to_string(),
                        row,
                        value: cell.to_string(),
                    })
            })
            .collect()
    }

    fn parse_timestamps(table: &RawTable, col: usize) -> CleaningResult<Vec<NaiveDateTime>> {
        let name = table.headers[col].trim();
        (0..table.height())
            .map(|row| {
                let cell = table.cell(row, col);
                parse_timestamp(cell).ok_or_else(|| CleaningError::InvalidDate {
                    column: name.to_string(),
                    row,
                    value: cell.to_string(),
                })
            })
            .collect()
    }

    fn compose_date_hour(
        table: &RawTable,
        date_col: usize,
        hour_col: usize,
    ) -> CleaningResult<Vec<NaiveDateTime>> {
        let date_name = table.headers[date_col].trim();
        let hour_name = table.headers[hour_col].trim();
        (0..table.height())
            .map(|row| {
                let date_cell = table.cell(row, date_col);
                let date = parse_date(date_cell).ok_or_else(|| CleaningError::InvalidDate {
                    column: date_name.to_string(),
                    row,
                    value: date_cell.to_string(),
                })?;
                let hour_cell = table.cell(row, hour_col);
                let hour = parse_hour(hour_cell).ok_or_else(|| CleaningError::InvalidDate {
                    column: hour_name.to_string(),
                    row,
                    value: hour_cell.to_string(),
                })?;
                let time = NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| {
                    CleaningError::InvalidDate {
                        column: hour_name.to_string(),
                        row,
                        value: hour_cell.to_string(),
                    }
                })?;
                Ok(date.and_time(time))
            })
            .collect()
    }
}

/// Lowercase, drop whitespace, underscores and hyphens.
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn find_alias(table: &RawTable, used: &[bool], aliases: &[&str]) -> Option<usize> {
    let wanted: Vec<String> = aliases.iter().map(|a| normalize_header(a)).collect();
    // Alias order is priority order: "gi" beats "irradiance" regardless of
    // header position.
    wanted.iter().find_map(|alias| {
        table
            .headers
            .iter()
            .enumerate()
            .position(|(idx, h)| !used[idx] && normalize_header(h) == *alias)
    })
}

fn is_reserved(name: &str) -> bool {
    matches!(
        normalize_header(name).as_str(),
        "timestamp" | "date" | "hour" | "gi" | "tm" | "eac"
    )
}

/// Parse a timestamp cell; a bare date means midnight.
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .or_else(|| parse_date(cell).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
}

/// Hour of day from `"13"`, `"13.0"` or `"13:00"`.
fn parse_hour(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    let head = cell.split(':').next().unwrap_or(cell);
    let value: f64 = head.parse().ok()?;
    if value.fract() != 0.0 || !(0.0..=23.0).contains(&value) {
        return None;
    }
    Some(value as u32)
}
