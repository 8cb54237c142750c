//! Core dataset storage operations.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::DatasetInfo;
use crate::db::models::{NewDataset, StoreOutcome, StoredDataset};
use crate::models::DataId;

/// Repository trait for uploaded and cleaned datasets.
///
/// Stored datasets are immutable: cleaning produces a new dataset rather than
/// rewriting the source.
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Check if the storage backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store a dataset.
    ///
    /// Identical content under the same file name is deduplicated by checksum;
    /// the existing entry is returned with `duplicate = true`.
    ///
    /// # Errors
    /// * `ValidationError` if the dataset has no records or an empty file name
    async fn store_dataset(&self, dataset: NewDataset) -> RepositoryResult<StoreOutcome>;

    /// Retrieve a dataset by id.
    ///
    /// # Errors
    /// * `NotFound` if no dataset has this id
    async fn get_dataset(&self, data_id: DataId) -> RepositoryResult<StoredDataset>;

    /// Retrieve the most recently stored dataset with the given file name.
    async fn get_dataset_by_name(&self, file_name: &str) -> RepositoryResult<StoredDataset>;

    /// List metadata for every stored dataset, ordered by id.
    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>>;
}
