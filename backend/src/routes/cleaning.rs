use serde::{Deserialize, Serialize};

use crate::models::DataId;

/// Body of a save-cleaned-data request.
///
/// Field names follow the frontend form; `z_threshold` is the Z-score cutoff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveCleanedRequest {
    pub file_name: String,
    #[serde(default = "default_true")]
    pub apply_outlier: bool,
    #[serde(default)]
    pub outlier_method: Option<String>,
    #[serde(default)]
    pub iqr_factor: Option<f64>,
    #[serde(default)]
    pub z_threshold: Option<f64>,
    #[serde(default)]
    pub isolation_contamination: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCleanedResponse {
    pub new_file_name: String,
    pub rows_after_cleaning: usize,
    pub data_id: DataId,
    pub removed_rows: usize,
}

pub const SAVE_CLEANED_DATA_PATH: &str = "/save-cleaned-data";

/// Prefix given to stored cleaned datasets.
pub const CLEANED_PREFIX: &str = "cleaned_";
