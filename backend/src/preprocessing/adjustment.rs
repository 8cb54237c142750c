//! GI/TM adjustment: the `raw -> gi_tm_adjusted` transformation.
//!
//! Records with `GI == 0` (night time or a dead pyranometer) are dropped.
//! `TM == 0` readings are treated as missing and imputed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{push_warning, CleaningError, PipelineWarning};
use crate::models::{Dataset, Record};

/// Imputation strategy for zero temperature readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TmFill {
    /// Previous non-zero reading in dataset order; leading zeros take the
    /// next one.
    #[default]
    ForwardBackward,
    /// Mean of the non-zero readings on the same calendar date, falling
    /// back to forward/backward fill for dates without any.
    DailyMean,
}

impl FromStr for TmFill {
    type Err = CleaningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward_backward" | "ffill" | "forward" => Ok(TmFill::ForwardBackward),
            "daily_mean" | "mean" => Ok(TmFill::DailyMean),
            other => Err(CleaningError::invalid_parameter(
                "tm_fill",
                format!("'{}' is not one of forward_backward, daily_mean", other),
            )),
        }
    }
}

/// Output of [`adjust_gi_tm`].
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub dataset: Dataset,
    pub dropped_zero_gi: usize,
    pub imputed_tm: usize,
    pub warnings: Vec<PipelineWarning>,
}

/// Drop `GI == 0` records, then impute `TM == 0` on what remains.
pub fn adjust_gi_tm(raw: &Dataset, fill: TmFill) -> Adjustment {
    let mut records: Vec<Record> = raw
        .records()
        .iter()
        .filter(|r| r.gi != 0.0)
        .cloned()
        .collect();
    let dropped_zero_gi = raw.len() - records.len();

    let mut warnings = Vec::new();
    let zero_tm: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.tm == 0.0)
        .map(|(i, _)| i)
        .collect();

    let mut imputed_tm = 0;
    if !zero_tm.is_empty() {
        let filled = match fill {
            TmFill::ForwardBackward => forward_backward(&records),
            TmFill::DailyMean => daily_mean(&records),
        };
        match filled {
            Some(values) => {
                for &i in &zero_tm {
                    records[i].tm = values[i];
                }
                imputed_tm = zero_tm.len();
            }
            None => push_warning(
                &mut warnings,
                PipelineWarning::TemperatureUnimputable {
                    records: zero_tm.len(),
                },
            ),
        }
    }

    log::debug!(
        "GI/TM adjustment: dropped {} zero-GI records, imputed {} zero-TM readings",
        dropped_zero_gi,
        imputed_tm
    );

    Adjustment {
        dataset: raw.with_records(records),
        dropped_zero_gi,
        imputed_tm,
        warnings,
    }
}

/// TM series with zeros replaced, or `None` if there is nothing to fill from.
fn forward_backward(records: &[Record]) -> Option<Vec<f64>> {
    let first_valid = records.iter().map(|r| r.tm).find(|&t| t != 0.0)?;
    let mut last = first_valid;
    Some(
        records
            .iter()
            .map(|r| {
                if r.tm != 0.0 {
                    last = r.tm;
                }
                last
            })
            .collect(),
    )
}

fn daily_mean(records: &[Record]) -> Option<Vec<f64>> {
    let fallback = forward_backward(records)?;

    let mut sums: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for r in records.iter().filter(|r| r.tm != 0.0) {
        let entry = sums.entry(r.timestamp.date()).or_insert((0.0, 0));
        entry.0 += r.tm;
        entry.1 += 1;
    }

    Some(
        records
            .iter()
            .zip(fallback)
            .map(|(r, fb)| match sums.get(&r.timestamp.date()) {
                Some((sum, count)) if r.tm == 0.0 => sum / *count as f64,
                _ => fb,
            })
            .collect(),
    )
}
