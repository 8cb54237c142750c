//! Error types for the cleaning pipeline.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::models::Stage;

/// Result type for cleaning pipeline operations
pub type CleaningResult<T> = std::result::Result<T, CleaningError>;

/// Errors that reject a whole pipeline invocation.
///
/// Degenerate inputs (too few points, zero variance, empty stages) are not
/// errors; they are reported next to the results as [`PipelineWarning`]s.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CleaningError {
    /// A required column is absent from the upload
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// A required column holds a value that does not parse as a number
    #[error("Column '{column}' is not numeric: row {row} has value '{value}'")]
    NonNumericColumn {
        column: String,
        row: usize,
        value: String,
    },

    /// A date or timestamp cell cannot be parsed
    #[error("Column '{column}' has an unparseable date at row {row}: '{value}'")]
    InvalidDate {
        column: String,
        row: usize,
        value: String,
    },

    /// A stage was requested without its prerequisite stage
    #[error("Stage '{requested}' requires stage '{missing}' to be applied first")]
    StageOrder {
        requested: &'static str,
        missing: &'static str,
    },

    /// A policy or pipeline parameter is outside its valid range
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Irradiance unit not in the conversion table
    #[error("Unsupported irradiance unit: {0}")]
    UnknownUnit(String),

    /// Outlier method name not recognised
    #[error("Unknown outlier method: {0}")]
    UnknownOutlierMethod(String),

    /// Upload contained no header or no rows
    #[error("Upload contains no data rows")]
    EmptyUpload,

    /// Malformed CSV or JSON input
    #[error("Parse error: {0}")]
    Parse(String),
}

impl CleaningError {
    /// Shorthand for [`CleaningError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is caused by the uploaded data itself, which the
    /// user must fix and re-upload.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. }
                | Self::NonNumericColumn { .. }
                | Self::InvalidDate { .. }
                | Self::EmptyUpload
                | Self::Parse(_)
        )
    }
}

impl From<csv::Error> for CleaningError {
    fn from(err: csv::Error) -> Self {
        CleaningError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for CleaningError {
    fn from(err: serde_json::Error) -> Self {
        CleaningError::Parse(err.to_string())
    }
}

/// Non-fatal condition reported alongside pipeline results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// Too few points for the requested statistic; the mask degrades to all-false.
    InsufficientData {
        column: String,
        count: usize,
        required: usize,
    },
    /// Every value in the column is identical.
    ZeroVariance { column: String },
    /// A stage has no records left after filtering.
    EmptyStage { stage: Stage },
    /// `TM == 0` readings left as-is because no non-zero temperature exists.
    TemperatureUnimputable { records: usize },
    /// Pearson correlation undefined for a column pair.
    UndefinedCorrelation { x: String, y: String },
    /// Upload column ignored because it is neither required nor numeric.
    DroppedColumn { column: String },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData {
                column,
                count,
                required,
            } => write!(
                f,
                "Column '{}' has {} values, at least {} required; no outliers flagged",
                column, count, required
            ),
            Self::ZeroVariance { column } => {
                write!(f, "Column '{}' has zero variance; no outliers flagged", column)
            }
            Self::EmptyStage { stage } => write!(f, "Stage '{}' has no valid data", stage),
            Self::TemperatureUnimputable { records } => write!(
                f,
                "{} TM readings are zero and no non-zero temperature is available to impute them",
                records
            ),
            Self::UndefinedCorrelation { x, y } => {
                write!(f, "Correlation between '{}' and '{}' is undefined", x, y)
            }
            Self::DroppedColumn { column } => {
                write!(f, "Column '{}' is not numeric and was ignored", column)
            }
        }
    }
}

/// Push `warning` unless an equal one is already present.
pub(crate) fn push_warning(warnings: &mut Vec<PipelineWarning>, warning: PipelineWarning) {
    if !warnings.contains(&warning) {
        log::warn!("{}", warning);
        warnings.push(warning);
    }
}

/// Error returned by request-level services that touch both the repository
/// and the pipeline.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Cleaning(#[from] CleaningError),

    #[error(transparent)]
    Repository(#[from] crate::db::repository::RepositoryError),

    /// Blocking pipeline task was cancelled or panicked
    #[error("Pipeline task failed: {0}")]
    Task(String),
}

/// Result type for request-level services
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_names_column() {
        let err = CleaningError::MissingColumn {
            column: "GI".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required column: GI");
        assert!(err.is_validation());
    }

    #[test]
    fn test_stage_order_message_names_prerequisite() {
        let err = CleaningError::StageOrder {
            requested: "outlier_removed",
            missing: "gi_tm_adjusted",
        };
        let msg = err.to_string();
        assert!(msg.contains("gi_tm_adjusted"));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = PipelineWarning::ZeroVariance {
            column: "TM".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "zero_variance");
        assert_eq!(json["column"], "TM");
    }

    #[test]
    fn test_push_warning_deduplicates() {
        let mut warnings = Vec::new();
        let w = PipelineWarning::EmptyStage {
            stage: Stage::OutlierRemoved,
        };
        push_warning(&mut warnings, w.clone());
        push_warning(&mut warnings, w);
        assert_eq!(warnings.len(), 1);
    }
}
