//! High-level repository service layer.
//!
//! Repository-agnostic operations that work with any implementation of the
//! repository traits. Logging and cross-cutting checks live here so every
//! backend behaves the same.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  HTTP handlers / request services           │
//! └──────────────────────┬──────────────────────┘
//!                        │
//! ┌──────────────────────▼──────────────────────┐
//! │  Service Layer (services.rs)                │
//! └──────────────────────┬──────────────────────┘
//!                        │
//! ┌──────────────────────▼──────────────────────┐
//! │  Repository Traits (repository/)            │
//! │  - DatasetRepository                        │
//! │  - LineageRepository                        │
//! └──────────────────────┬──────────────────────┘
//!                        │
//!             ┌──────────▼──────────┐
//!             │ Local Repository    │
//!             │ (in-memory)         │
//!             └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use sfp_rust::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let datasets = services::list_datasets(&repo).await?;
//!     println!("Found {} datasets", datasets.len());
//!     Ok(())
//! }
//! ```

use log::{debug, info};

use super::models::{NewDataset, StoreOutcome, StoredDataset};
use super::repository::{FullRepository, RepositoryResult};
use crate::api::DatasetInfo;
use crate::models::DataId;

// ==================== Health & Connection ====================

/// Check if the repository is healthy.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Dataset Operations ====================

/// Store a dataset, deduplicating identical content.
pub async fn store_dataset<R: FullRepository + ?Sized>(
    repo: &R,
    dataset: NewDataset,
) -> RepositoryResult<StoreOutcome> {
    let file_name = dataset.file_name.clone();
    let rows = dataset.dataset.len();
    let outcome = repo.store_dataset(dataset).await?;

    if outcome.duplicate {
        info!(
            "Dataset '{}' already stored as id {} (checksum {}), reusing",
            file_name, outcome.info.data_id, outcome.info.checksum
        );
    } else {
        info!(
            "Stored dataset '{}' as id {} ({} rows)",
            file_name, outcome.info.data_id, rows
        );
    }
    Ok(outcome)
}

/// Fetch a dataset by id.
pub async fn get_dataset<R: FullRepository + ?Sized>(
    repo: &R,
    data_id: DataId,
) -> RepositoryResult<StoredDataset> {
    let stored = repo.get_dataset(data_id).await?;
    debug!(
        "Loaded dataset {} '{}' ({} rows)",
        data_id,
        stored.info.file_name,
        stored.dataset.len()
    );
    Ok(stored)
}

/// Fetch the latest dataset stored under `file_name`.
pub async fn get_dataset_by_name<R: FullRepository + ?Sized>(
    repo: &R,
    file_name: &str,
) -> RepositoryResult<StoredDataset> {
    repo.get_dataset_by_name(file_name).await
}

pub async fn list_datasets<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<DatasetInfo>> {
    repo.list_datasets().await
}

// ==================== Lineage ====================

pub async fn list_derived<R: FullRepository + ?Sized>(
    repo: &R,
    source: DataId,
) -> RepositoryResult<Vec<DatasetInfo>> {
    repo.list_derived(source).await
}

/// Id chain from `data_id` back to its original upload.
pub async fn lineage<R: FullRepository + ?Sized>(
    repo: &R,
    data_id: DataId,
) -> RepositoryResult<Vec<DataId>> {
    repo.lineage(data_id).await
}
