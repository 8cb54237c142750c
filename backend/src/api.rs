//! Public API surface for the cleaning backend.
//!
//! This file consolidates the DTO types for the HTTP API.
//! All types derive Serialize for JSON serialization.

pub use crate::routes::cleaning::SaveCleanedRequest;
pub use crate::routes::cleaning::SaveCleanedResponse;
pub use crate::routes::datasets::DatasetInfo;
pub use crate::routes::datasets::DatasetListResponse;
pub use crate::routes::datasets::UploadDatasetRequest;
pub use crate::routes::datasets::UploadDatasetResponse;
pub use crate::routes::health::HealthResponse;
pub use crate::routes::units::ConvertRequest;
pub use crate::routes::units::ConvertResponse;
pub use crate::routes::visualize::BoxPlotGroups;
pub use crate::routes::visualize::CorrelationHeatmap;
pub use crate::routes::visualize::GroupSummary;
pub use crate::routes::visualize::Histogram;
pub use crate::routes::visualize::ScatterMatrix;
pub use crate::routes::visualize::ScatterPair;
pub use crate::routes::visualize::StageArtifacts;
pub use crate::routes::visualize::StageView;
pub use crate::routes::visualize::StagesView;
pub use crate::routes::visualize::VisualizeData;
pub use crate::routes::visualize::VisualizeQuery;

pub use crate::error::PipelineWarning;
pub use crate::models::{DataId, IrradianceUnit, SiteId, Stage};
