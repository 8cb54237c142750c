//! Dataset lineage queries.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::DatasetInfo;
use crate::models::DataId;

/// Repository trait for cleaned-dataset lineage.
#[async_trait]
pub trait LineageRepository: Send + Sync {
    /// Datasets derived from `source`, ordered by id.
    ///
    /// # Errors
    /// * `NotFound` if `source` does not exist
    async fn list_derived(&self, source: DataId) -> RepositoryResult<Vec<DatasetInfo>>;

    /// Walk `derived_from` links back to the original upload.
    ///
    /// The returned chain starts with `data_id` itself.
    async fn lineage(&self, data_id: DataId) -> RepositoryResult<Vec<DataId>>;
}
