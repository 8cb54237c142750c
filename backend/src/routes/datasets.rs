use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PipelineWarning;
use crate::models::{DataId, IrradianceUnit, SiteId};
use crate::preprocessing::ValidationStats;

/// Listing entry for a stored dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub data_id: DataId,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<SiteId>,
    pub rows: usize,
    pub columns: Vec<String>,
    /// Unit the GI column was recorded in.
    pub irradiance_unit: IrradianceUnit,
    /// Set on cleaned datasets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<DataId>,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

/// Upload body. Exactly one of `csv` and `records` must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadDatasetRequest {
    pub file_name: String,
    #[serde(default)]
    pub csv: Option<String>,
    /// JSON records, one object per row.
    #[serde(default)]
    pub records: Option<serde_json::Value>,
    #[serde(default)]
    pub site_id: Option<SiteId>,
    #[serde(default)]
    pub irradiance_unit: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadDatasetResponse {
    pub data_id: DataId,
    pub file_name: String,
    pub rows: usize,
    /// The same content was already stored under this name.
    pub duplicate: bool,
    pub stats: ValidationStats,
    pub warnings: Vec<PipelineWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetListResponse {
    pub datasets: Vec<DatasetInfo>,
    pub total: usize,
}

pub const DATASETS_PATH: &str = "/datasets";
