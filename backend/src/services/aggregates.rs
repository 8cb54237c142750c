//! Grouped statistics for one pipeline stage.
//!
//! Histograms, ordered scatter pairs, calendar box plots and the Pearson
//! correlation matrix. The families are independent of each other, so
//! [`compute_stage_artifacts`] evaluates them in parallel with rayon.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::algorithms::{iqr_fences, min_max, pearson, quantile_sorted, sorted_finite};
use crate::api::{
    BoxPlotGroups, CorrelationHeatmap, GroupSummary, Histogram, ScatterMatrix, ScatterPair,
    StageArtifacts,
};
use crate::error::{push_warning, PipelineWarning};
use crate::models::{Column, Dataset, Record};

/// Calendar axis used to bucket records for box plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Month,
    DayOfYear,
    Hour,
}

impl Grouping {
    /// Every bucket label on the axis.
    pub fn labels(&self) -> RangeInclusive<u32> {
        match self {
            Grouping::Month => 1..=12,
            Grouping::DayOfYear => 1..=366,
            Grouping::Hour => 0..=23,
        }
    }

    pub fn key(&self, record: &Record) -> u32 {
        match self {
            Grouping::Month => record.month(),
            Grouping::DayOfYear => record.day_of_year(),
            Grouping::Hour => record.hour(),
        }
    }
}

/// Knobs shared by every stage of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactOptions {
    pub bins: usize,
    pub whisker_factor: f64,
    /// Column summarised by the box plots.
    pub box_column: Column,
}

impl Default for ArtifactOptions {
    fn default() -> Self {
        Self {
            bins: 15,
            whisker_factor: crate::algorithms::DEFAULT_WHISKER_FACTOR,
            box_column: Column::Eac,
        }
    }
}

/// Equal-width histogram over `[min, max]`.
///
/// The last bin includes `max`. A constant column gets edges
/// `[v - 0.5, v + 0.5]`. Non-finite values are ignored.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    let Some((mut lo, mut hi)) = min_max(values) else {
        return Histogram::default();
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    // Work in half-spans so columns reaching both ends of the f64 range
    // keep finite edges.
    let half_span = hi / 2.0 - lo / 2.0;
    let half_width = half_span / bins as f64;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| {
            if i == bins {
                hi
            } else {
                let step = half_width * i as f64;
                lo + step + step
            }
        })
        .collect();

    let mut counts = vec![0usize; bins];
    for &v in values.iter().filter(|v| v.is_finite()) {
        let mut idx = (((v / 2.0 - lo / 2.0) / half_span) * bins as f64) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        // Correct float rounding against the materialised edges.
        if idx > 0 && v < edges[idx] {
            idx -= 1;
        } else if idx + 1 < bins && v >= edges[idx + 1] {
            idx += 1;
        }
        counts[idx] += 1;
    }

    Histogram {
        bins: edges,
        counts,
    }
}

/// Histograms of every numeric column, extras included.
pub fn histograms(dataset: &Dataset, bins: usize) -> BTreeMap<String, Histogram> {
    dataset
        .numeric_columns()
        .into_iter()
        .filter_map(|name| {
            let values = dataset.numeric_values(&name)?;
            Some((name, histogram(&values, bins)))
        })
        .collect()
}

/// Scatter coordinates for every ordered pair of monitored columns.
///
/// With a `mask` aligned to `dataset`, each pair carries per-point flags.
pub fn scatter_pairs(dataset: &Dataset, mask: Option<&[bool]>) -> BTreeMap<String, ScatterPair> {
    let outlier = mask.map(|m| {
        (0..dataset.len())
            .map(|i| m.get(i).copied().unwrap_or(false))
            .collect::<Vec<bool>>()
    });

    let mut pairs = BTreeMap::new();
    for x in Column::MONITORED {
        for y in Column::MONITORED {
            if x == y {
                continue;
            }
            pairs.insert(
                ScatterMatrix::pair_key(x.name(), y.name()),
                ScatterPair {
                    x: dataset.values(x),
                    y: dataset.values(y),
                    outlier: outlier.clone(),
                },
            );
        }
    }
    pairs
}

pub fn scatter_matrix(dataset: &Dataset, mask: Option<&[bool]>, bins: usize) -> ScatterMatrix {
    ScatterMatrix {
        variables: Column::MONITORED.iter().map(|c| c.name().to_string()).collect(),
        pairs: scatter_pairs(dataset, mask),
        hist: histograms(dataset, bins),
    }
}

/// Five-number summary with Tukey whiskers at `whisker_factor` IQRs.
///
/// Whiskers end at the most extreme values inside the fences; values
/// outside them are listed as outliers in ascending order.
pub fn group_summary(values: &[f64], whisker_factor: f64) -> GroupSummary {
    let sorted = sorted_finite(values);
    let (Some(q1), Some(median), Some(q3)) = (
        quantile_sorted(&sorted, 0.25),
        quantile_sorted(&sorted, 0.5),
        quantile_sorted(&sorted, 0.75),
    ) else {
        return GroupSummary::default();
    };

    let (lower, upper) = iqr_fences(q1, q3, whisker_factor);
    let inside = || sorted.iter().copied().filter(|v| *v >= lower && *v <= upper);

    GroupSummary {
        count: sorted.len(),
        min: sorted.first().copied(),
        q1: Some(q1),
        median: Some(median),
        q3: Some(q3),
        max: sorted.last().copied(),
        whisker_low: inside().next(),
        whisker_high: inside().last(),
        outliers: sorted
            .iter()
            .copied()
            .filter(|v| *v < lower || *v > upper)
            .collect(),
    }
}

/// Box plot of `column` bucketed by `grouping`, with an explicit (empty)
/// entry for every bucket that has no records.
pub fn boxplot_by(
    dataset: &Dataset,
    grouping: Grouping,
    column: Column,
    whisker_factor: f64,
) -> BoxPlotGroups {
    let mut buckets: BTreeMap<u32, Vec<f64>> =
        grouping.labels().map(|label| (label, Vec::new())).collect();
    for record in dataset.records() {
        buckets
            .entry(grouping.key(record))
            .or_default()
            .push(record.get(column));
    }

    buckets
        .into_iter()
        .map(|(label, values)| (label, group_summary(&values, whisker_factor)))
        .collect()
}

/// Pearson matrix over the monitored columns.
///
/// The diagonal is always 1. Off-diagonal cells are `None` when a column
/// has zero variance or fewer than two records, each such pair reported
/// once as a warning.
pub fn correlation_matrix(dataset: &Dataset) -> (CorrelationHeatmap, Vec<PipelineWarning>) {
    let columns = Column::MONITORED;
    let values: Vec<Vec<f64>> = columns.iter().map(|&c| dataset.values(c)).collect();
    let mut warnings = Vec::new();
    let mut matrix = vec![vec![None; columns.len()]; columns.len()];

    for i in 0..columns.len() {
        matrix[i][i] = Some(1.0);
        for j in (i + 1)..columns.len() {
            let r = pearson(&values[i], &values[j]);
            if r.is_none() {
                push_warning(
                    &mut warnings,
                    PipelineWarning::UndefinedCorrelation {
                        x: columns[i].name().to_string(),
                        y: columns[j].name().to_string(),
                    },
                );
            }
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    let heatmap = CorrelationHeatmap {
        variables: columns.iter().map(|c| c.name().to_string()).collect(),
        matrix,
    };
    (heatmap, warnings)
}

/// All derived statistics of one stage.
///
/// `correlation` is computed once on the raw stage by the caller and
/// attached unchanged.
pub fn compute_stage_artifacts(
    dataset: &Dataset,
    mask: Option<&[bool]>,
    correlation: &CorrelationHeatmap,
    options: &ArtifactOptions,
) -> StageArtifacts {
    let group = |grouping| boxplot_by(dataset, grouping, options.box_column, options.whisker_factor);

    let (scatter_matrix, (boxplot_by_month, (boxplot_by_day, boxplot_by_hour))) = rayon::join(
        || scatter_matrix(dataset, mask, options.bins),
        || {
            rayon::join(
                || group(Grouping::Month),
                || rayon::join(|| group(Grouping::DayOfYear), || group(Grouping::Hour)),
            )
        },
    );

    StageArtifacts {
        scatter_matrix,
        boxplot_by_month,
        boxplot_by_day,
        boxplot_by_hour,
        correlation_heatmap_full: correlation.clone(),
    }
}
