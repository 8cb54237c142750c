//! Service layer for the cleaning pipeline.
//!
//! `aggregates` holds the grouped statistics computed per stage. The other
//! modules orchestrate one endpoint each: load from the repository, run the
//! pipeline on a blocking thread, persist or shape the result.

pub mod aggregates;
pub mod cleaned_data;
pub mod ingest;
pub mod unit_adjustment;
pub mod visualize;


pub use aggregates::{
    boxplot_by, compute_stage_artifacts, correlation_matrix, group_summary, histogram,
    histograms, scatter_matrix, scatter_pairs, ArtifactOptions, Grouping,
};
pub use cleaned_data::{cleaned_file_name, save_cleaned_data};
pub use ingest::{ingest_upload, parse_upload, preload_directory};
pub use unit_adjustment::{convert_irradiance, preview_conversion};
pub use visualize::{build_visualize_data, get_visualize_data, pipeline_options};

use crate::error::{ServiceError, ServiceResult};

/// Run CPU-bound pipeline work off the async runtime.
pub(crate) async fn run_blocking<T, F>(work: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Task(format!("Task join error: {}", e)))?
}
