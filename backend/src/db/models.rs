//! Storage-side dataset records.

use serde::{Deserialize, Serialize};

use crate::api::DatasetInfo;
use crate::models::{DataId, Dataset, IrradianceUnit, SiteId};

/// A validated dataset about to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataset {
    pub file_name: String,
    pub site_id: Option<SiteId>,
    pub irradiance_unit: IrradianceUnit,
    /// Source dataset when this one was produced by cleaning.
    pub derived_from: Option<DataId>,
    pub dataset: Dataset,
}

impl NewDataset {
    pub fn new(file_name: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            file_name: file_name.into(),
            site_id: None,
            irradiance_unit: IrradianceUnit::default(),
            derived_from: None,
            dataset,
        }
    }

    pub fn with_site(mut self, site_id: Option<SiteId>) -> Self {
        self.site_id = site_id;
        self
    }

    pub fn with_unit(mut self, unit: IrradianceUnit) -> Self {
        self.irradiance_unit = unit;
        self
    }

    pub fn derived_from(mut self, source: DataId) -> Self {
        self.derived_from = Some(source);
        self
    }
}

/// A stored dataset with its listing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDataset {
    pub info: DatasetInfo,
    pub dataset: Dataset,
}

/// Outcome of a store call: the stored (or already present) dataset info.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOutcome {
    pub info: DatasetInfo,
    /// `true` when an identical dataset already existed and was reused.
    pub duplicate: bool,
}
