//! Outlier detection policies.
//!
//! Every detector is a pure function of `(values, policy)` returning a
//! boolean mask aligned index-for-index with its input. Degenerate inputs
//! degrade to an all-false mask plus a [`PipelineWarning`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::isolation_forest::{isolation_forest_mask, IsolationForestParams};
use super::statistics::{mean, quartiles, sample_std};
use crate::error::{push_warning, CleaningError, CleaningResult, PipelineWarning};
use crate::models::{Column, Dataset};

/// Minimum number of values for the IQR rule.
pub const IQR_MIN_POINTS: usize = 4;
/// Whisker length used when the active policy carries no IQR factor.
pub const DEFAULT_WHISKER_FACTOR: f64 = 1.5;

/// The active outlier strategy and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierPolicy {
    #[default]
    None,
    Iqr {
        factor: f64,
    },
    #[serde(rename = "zscore")]
    ZScore {
        threshold: f64,
    },
    IsolationForest(IsolationForestParams),
    /// Union of a multivariate Isolation Forest and the IQR rule.
    #[serde(rename = "default")]
    Composite {
        iqr_factor: f64,
        isolation: IsolationForestParams,
    },
}

/// Parameter values available when building a policy from a method name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyParams {
    pub iqr_factor: f64,
    pub zscore_threshold: f64,
    pub isolation: IsolationForestParams,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            iqr_factor: DEFAULT_WHISKER_FACTOR,
            zscore_threshold: 3.0,
            isolation: IsolationForestParams::default(),
        }
    }
}

impl OutlierPolicy {
    /// Build and validate a policy from its wire name.
    ///
    /// Accepts `none`, `iqr`, `zscore` (also `z_score`, `z-score`),
    /// `isolation_forest` (also `iforest`) and `default` (also `composite`).
    pub fn from_method(method: &str, params: &PolicyParams) -> CleaningResult<Self> {
        let normalized: String = method
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect();
        let policy = match normalized.as_str() {
            "" | "none" => OutlierPolicy::None,
            "iqr" => OutlierPolicy::Iqr {
                factor: params.iqr_factor,
            },
            "zscore" => OutlierPolicy::ZScore {
                threshold: params.zscore_threshold,
            },
            "isolationforest" | "iforest" => OutlierPolicy::IsolationForest(params.isolation),
            "default" | "composite" => OutlierPolicy::Composite {
                iqr_factor: params.iqr_factor,
                isolation: params.isolation,
            },
            _ => return Err(CleaningError::UnknownOutlierMethod(method.to_string())),
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutlierPolicy::None => "none",
            OutlierPolicy::Iqr { .. } => "iqr",
            OutlierPolicy::ZScore { .. } => "zscore",
            OutlierPolicy::IsolationForest(_) => "isolation_forest",
            OutlierPolicy::Composite { .. } => "default",
        }
    }

    pub fn validate(&self) -> CleaningResult<()> {
        match self {
            OutlierPolicy::None => Ok(()),
            OutlierPolicy::Iqr { factor } => validate_positive("iqr_factor", *factor),
            OutlierPolicy::ZScore { threshold } => validate_positive("zscore_threshold", *threshold),
            OutlierPolicy::IsolationForest(params) => params.validate(),
            OutlierPolicy::Composite {
                iqr_factor,
                isolation,
            } => {
                validate_positive("iqr_factor", *iqr_factor)?;
                isolation.validate()
            }
        }
    }

    /// Box-plot whisker length in IQRs: the policy's own factor when it has
    /// one, so whiskers and flagged points agree.
    pub fn whisker_factor(&self) -> f64 {
        match self {
            OutlierPolicy::Iqr { factor } => *factor,
            OutlierPolicy::Composite { iqr_factor, .. } => *iqr_factor,
            _ => DEFAULT_WHISKER_FACTOR,
        }
    }
}

impl fmt::Display for OutlierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierPolicy::None => write!(f, "none"),
            OutlierPolicy::Iqr { factor } => write!(f, "iqr(factor={})", factor),
            OutlierPolicy::ZScore { threshold } => write!(f, "zscore(threshold={})", threshold),
            OutlierPolicy::IsolationForest(p) => write!(
                f,
                "isolation_forest(contamination={}, seed={})",
                p.contamination, p.seed
            ),
            OutlierPolicy::Composite {
                iqr_factor,
                isolation,
            } => write!(
                f,
                "default(iqr_factor={}, contamination={}, seed={})",
                iqr_factor, isolation.contamination, isolation.seed
            ),
        }
    }
}

fn validate_positive(name: &str, value: f64) -> CleaningResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CleaningError::invalid_parameter(
            name,
            format!("must be a positive number, got {}", value),
        ))
    }
}

/// How per-column masks merge into one record mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    /// Flag a record when any column flags it.
    #[default]
    Any,
    /// Flag a record only when every column flags it.
    All,
}

/// A mask plus the degenerate-input conditions met while computing it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Detection {
    pub mask: Vec<bool>,
    pub warnings: Vec<PipelineWarning>,
}

impl Detection {
    pub fn clear(len: usize) -> Self {
        Self {
            mask: vec![false; len],
            warnings: Vec::new(),
        }
    }

    fn degraded(len: usize, warning: PipelineWarning) -> Self {
        log::warn!("{}", warning);
        Self {
            mask: vec![false; len],
            warnings: vec![warning],
        }
    }

    pub fn flagged(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    fn merge(mut self, other: Detection, mode: CombineMode) -> Self {
        for (mine, theirs) in self.mask.iter_mut().zip(&other.mask) {
            *mine = match mode {
                CombineMode::Any => *mine || *theirs,
                CombineMode::All => *mine && *theirs,
            };
        }
        for warning in other.warnings {
            push_warning(&mut self.warnings, warning);
        }
        self
    }
}

/// Lower and upper Tukey fences.
pub fn iqr_fences(q1: f64, q3: f64, factor: f64) -> (f64, f64) {
    let iqr = q3 - q1;
    (q1 - factor * iqr, q3 + factor * iqr)
}

/// Flag values outside `[Q1 - factor*IQR, Q3 + factor*IQR]`.
///
/// # Examples
///
/// ```
/// use sfp_rust::algorithms::iqr_mask;
///
/// let eac = [10.0, 11.0, 9.0, 10.0, 12.0, 9.0, 11.0, 100.0];
/// let detection = iqr_mask(&eac, 1.5, "EAC");
/// assert_eq!(detection.mask, vec![false, false, false, false, false, false, false, true]);
/// ```
pub fn iqr_mask(values: &[f64], factor: f64, column: &str) -> Detection {
    let count = values.iter().filter(|v| v.is_finite()).count();
    if count < IQR_MIN_POINTS {
        return Detection::degraded(
            values.len(),
            PipelineWarning::InsufficientData {
                column: column.to_string(),
                count,
                required: IQR_MIN_POINTS,
            },
        );
    }
    let Some((q1, q3)) = quartiles(values) else {
        return Detection::clear(values.len());
    };
    let (lower, upper) = iqr_fences(q1, q3, factor);
    Detection {
        mask: values.iter().map(|&v| v < lower || v > upper).collect(),
        warnings: Vec::new(),
    }
}

/// Flag values whose absolute z-score (sample standard deviation) exceeds
/// `threshold`. A zero-variance column flags nothing.
pub fn zscore_mask(values: &[f64], threshold: f64, column: &str) -> Detection {
    let count = values.iter().filter(|v| v.is_finite()).count();
    let (Some(m), Some(std)) = (mean(values), sample_std(values)) else {
        return Detection::degraded(
            values.len(),
            PipelineWarning::InsufficientData {
                column: column.to_string(),
                count,
                required: 2,
            },
        );
    };
    if std == 0.0 {
        return Detection::degraded(
            values.len(),
            PipelineWarning::ZeroVariance {
                column: column.to_string(),
            },
        );
    }
    Detection {
        mask: values
            .iter()
            .map(|&v| ((v - m) / std).abs() > threshold)
            .collect(),
        warnings: Vec::new(),
    }
}

/// Run `policy` on a single column.
pub fn detect(values: &[f64], policy: &OutlierPolicy) -> CleaningResult<Detection> {
    detect_column(values, "value", policy)
}

/// [`detect`] with the column name used in warnings.
pub fn detect_column(values: &[f64], column: &str, policy: &OutlierPolicy) -> CleaningResult<Detection> {
    policy.validate()?;
    let detection = match policy {
        OutlierPolicy::None => Detection::clear(values.len()),
        OutlierPolicy::Iqr { factor } => iqr_mask(values, *factor, column),
        OutlierPolicy::ZScore { threshold } => zscore_mask(values, *threshold, column),
        OutlierPolicy::IsolationForest(params) => {
            let points: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
            Detection {
                mask: isolation_forest_mask(&points, params),
                warnings: Vec::new(),
            }
        }
        OutlierPolicy::Composite {
            iqr_factor,
            isolation,
        } => {
            let points: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
            let forest = Detection {
                mask: isolation_forest_mask(&points, isolation),
                warnings: Vec::new(),
            };
            forest.merge(iqr_mask(values, *iqr_factor, column), CombineMode::Any)
        }
    };
    Ok(detection)
}

/// Record-level mask over `columns` of `dataset`.
///
/// IQR and Z-score run per column and merge with `combine`. Isolation Forest
/// scores the columns jointly. The composite policy is the union of the
/// joint forest mask and the merged IQR mask.
pub fn detect_records(
    dataset: &Dataset,
    columns: &[Column],
    combine: CombineMode,
    policy: &OutlierPolicy,
) -> CleaningResult<Detection> {
    policy.validate()?;
    let n = dataset.len();
    if columns.is_empty() {
        return Ok(Detection::clear(n));
    }

    let per_column = |rule: &dyn Fn(&[f64], &str) -> Detection| -> Detection {
        columns
            .iter()
            .map(|&c| rule(dataset.values(c).as_slice(), c.name()))
            .reduce(|acc, next| acc.merge(next, combine))
            .unwrap_or_else(|| Detection::clear(n))
    };
    let joint_forest = |params: &IsolationForestParams| -> Detection {
        let points: Vec<Vec<f64>> = dataset
            .records()
            .iter()
            .map(|r| columns.iter().map(|&c| r.get(c)).collect())
            .collect();
        Detection {
            mask: isolation_forest_mask(&points, params),
            warnings: Vec::new(),
        }
    };

    let detection = match policy {
        OutlierPolicy::None => Detection::clear(n),
        OutlierPolicy::Iqr { factor } => per_column(&|v: &[f64], c: &str| iqr_mask(v, *factor, c)),
        OutlierPolicy::ZScore { threshold } => per_column(&|v: &[f64], c: &str| zscore_mask(v, *threshold, c)),
        OutlierPolicy::IsolationForest(params) => joint_forest(params),
        OutlierPolicy::Composite {
            iqr_factor,
            isolation,
        } => joint_forest(isolation).merge(
            per_column(&|v: &[f64], c: &str| iqr_mask(v, *iqr_factor, c)),
            CombineMode::Any,
        ),
    };

    log::debug!(
        "Outlier policy {} flagged {} of {} records",
        policy,
        detection.flagged(),
        n
    );
    Ok(detection)
}
