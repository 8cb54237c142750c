//! Validated tabular generation data.
//!
//! A [`Dataset`] is the immutable unit every pipeline stage consumes and
//! produces. Stages never mutate their input; they build a new dataset from
//! the records they keep.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::CleaningError;

/// The monitored measurement columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "EAC")]
    Eac,
    #[serde(rename = "GI")]
    Gi,
    #[serde(rename = "TM")]
    Tm,
}

impl Column {
    /// Monitored columns in display order.
    pub const MONITORED: [Column; 3] = [Column::Eac, Column::Gi, Column::Tm];

    /// Canonical column name.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Eac => "EAC",
            Column::Gi => "GI",
            Column::Tm => "TM",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = CleaningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EAC" => Ok(Column::Eac),
            "GI" => Ok(Column::Gi),
            "TM" => Ok(Column::Tm),
            other => Err(CleaningError::invalid_parameter(
                "column",
                format!("'{}' is not a monitored column (EAC, GI, TM)", other),
            )),
        }
    }
}

/// One hourly observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub gi: f64,
    pub tm: f64,
    pub eac: f64,
    /// Values of the dataset's extra numeric columns, aligned with
    /// [`Dataset::extra_columns`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<f64>,
}

impl Record {
    pub fn new(timestamp: NaiveDateTime, gi: f64, tm: f64, eac: f64) -> Self {
        Self {
            timestamp,
            gi,
            tm,
            eac,
            extra: Vec::new(),
        }
    }

    pub fn get(&self, column: Column) -> f64 {
        match column {
            Column::Eac => self.eac,
            Column::Gi => self.gi,
            Column::Tm => self.tm,
        }
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    /// Day of year, 1-366.
    pub fn day_of_year(&self) -> u32 {
        self.timestamp.ordinal()
    }

    /// Hour of day, 0-23.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// Ordered, validated records sharing one column set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    extra_columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(extra_columns: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            extra_columns,
            records,
        }
    }

    /// A dataset with the same column set and the given records.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            extra_columns: self.extra_columns.clone(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// All numeric column names: the monitored columns followed by extras.
    pub fn numeric_columns(&self) -> Vec<String> {
        Column::MONITORED
            .iter()
            .map(|c| c.name().to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }

    /// Every column name as presented to callers, timestamp first.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![
            "timestamp".to_string(),
            "date".to_string(),
            "hour".to_string(),
        ];
        names.extend(self.numeric_columns());
        names
    }

    pub fn values(&self, column: Column) -> Vec<f64> {
        self.records.iter().map(|r| r.get(column)).collect()
    }

    /// Values of any numeric column by name (monitored or extra).
    pub fn numeric_values(&self, name: &str) -> Option<Vec<f64>> {
        if let Ok(column) = name.parse::<Column>() {
            return Some(self.values(column));
        }
        let idx = self.extra_columns.iter().position(|c| c == name)?;
        Some(
            self.records
                .iter()
                .map(|r| r.extra.get(idx).copied().unwrap_or(f64::NAN))
                .collect(),
        )
    }

    /// New dataset keeping the records whose mask entry is `false`.
    ///
    /// The mask must be aligned index-for-index with this dataset; records
    /// beyond the end of a shorter mask are kept.
    pub fn without_masked(&self, mask: &[bool]) -> Self {
        let records = self
            .records
            .iter()
            .enumerate()
            .filter(|(i, _)| !mask.get(*i).copied().unwrap_or(false))
            .map(|(_, r)| r.clone())
            .collect();
        self.with_records(records)
    }

    /// Record `index` as a flat JSON object, the shape returned in samples.
    pub fn record_json(&self, index: usize) -> Option<Map<String, Value>> {
        let record = self.records.get(index)?;
        let mut row = Map::new();
        row.insert(
            "timestamp".to_string(),
            Value::String(record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        row.insert(
            "date".to_string(),
            Value::String(record.timestamp.format("%Y-%m-%d").to_string()),
        );
        row.insert("hour".to_string(), Value::from(record.hour()));
        for column in Column::MONITORED {
            row.insert(column.name().to_string(), json_number(record.get(column)));
        }
        for (name, value) in self.extra_columns.iter().zip(&record.extra) {
            row.insert(name.clone(), json_number(*value));
        }
        Some(row)
    }

    /// First `n` records as JSON objects.
    pub fn head_json(&self, n: usize) -> Vec<Map<String, Value>> {
        (0..self.len().min(n))
            .filter_map(|i| self.record_json(i))
            .collect()
    }
}

fn json_number(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
