//! In-memory local repository implementation.
//!
//! Datasets live in a `BTreeMap` keyed by [`DataId`], so listings come out in
//! insertion order without sorting.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::api::DatasetInfo;
use crate::db::checksum::dataset_checksum;
use crate::db::models::{NewDataset, StoreOutcome, StoredDataset};
use crate::db::repository::*;
use crate::models::DataId;

/// In-memory local repository.
///
/// # Example
/// ```
/// use sfp_rust::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.dataset_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    datasets: BTreeMap<DataId, StoredDataset>,
    /// checksum -> id, for deduplication
    checksums: HashMap<String, DataId>,

    next_data_id: DataId,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            datasets: BTreeMap::new(),
            checksums: HashMap::new(),
            next_data_id: DataId(1),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository. Health status is preserved.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of datasets stored.
    pub fn dataset_count(&self) -> usize {
        self.data.read().datasets.len()
    }

    pub fn has_dataset(&self, data_id: DataId) -> bool {
        self.data.read().datasets.contains_key(&data_id)
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(
                RepositoryError::connection("Repository is not healthy").with_operation(operation),
            );
        }
        Ok(())
    }

    fn not_found(data_id: DataId, operation: &str) -> RepositoryError {
        RepositoryError::not_found_with_context(
            format!("Dataset {} not found", data_id),
            ErrorContext::new(operation)
                .with_entity("dataset")
                .with_entity_id(data_id),
        )
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn store_dataset(&self, new: NewDataset) -> RepositoryResult<StoreOutcome> {
        self.check_health("store_dataset")?;

        if new.file_name.trim().is_empty() {
            return Err(RepositoryError::validation_with_context(
                "file name must not be empty",
                ErrorContext::new("store_dataset").with_entity("dataset"),
            ));
        }
        if new.dataset.is_empty() {
            return Err(RepositoryError::validation_with_context(
                format!("dataset '{}' has no records", new.file_name),
                ErrorContext::new("store_dataset").with_entity("dataset"),
            ));
        }

        let checksum = dataset_checksum(&new.file_name, &new.dataset)
            .map_err(|e| RepositoryError::from(e).with_operation("store_dataset"))?;

        let mut data = self.data.write();

        if let Some(source) = new.derived_from {
            if !data.datasets.contains_key(&source) {
                return Err(Self::not_found(source, "store_dataset"));
            }
        }

        if let Some(existing) = data.checksums.get(&checksum) {
            if let Some(stored) = data.datasets.get(existing) {
                return Ok(StoreOutcome {
                    info: stored.info.clone(),
                    duplicate: true,
                });
            }
        }

        let data_id = data.next_data_id;
        data.next_data_id = DataId(data_id.0 + 1);

        let info = DatasetInfo {
            data_id,
            file_name: new.file_name,
            site_id: new.site_id,
            rows: new.dataset.len(),
            columns: new.dataset.column_names(),
            irradiance_unit: new.irradiance_unit,
            derived_from: new.derived_from,
            checksum: checksum.clone(),
            created_at: Utc::now(),
        };

        data.checksums.insert(checksum, data_id);
        data.datasets.insert(
            data_id,
            StoredDataset {
                info: info.clone(),
                dataset: new.dataset,
            },
        );

        Ok(StoreOutcome {
            info,
            duplicate: false,
        })
    }

    async fn get_dataset(&self, data_id: DataId) -> RepositoryResult<StoredDataset> {
        self.check_health("get_dataset")?;
        self.data
            .read()
            .datasets
            .get(&data_id)
            .cloned()
            .ok_or_else(|| Self::not_found(data_id, "get_dataset"))
    }

    async fn get_dataset_by_name(&self, file_name: &str) -> RepositoryResult<StoredDataset> {
        self.check_health("get_dataset_by_name")?;
        self.data
            .read()
            .datasets
            .values()
            .rev()
            .find(|stored| stored.info.file_name == file_name)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("Dataset '{}' not found", file_name),
                    ErrorContext::new("get_dataset_by_name")
                        .with_entity("dataset")
                        .with_entity_id(file_name),
                )
            })
    }

    async fn list_datasets(&self) -> RepositoryResult<Vec<DatasetInfo>> {
        self.check_health("list_datasets")?;
        Ok(self
            .data
            .read()
            .datasets
            .values()
            .map(|stored| stored.info.clone())
            .collect())
    }
}

#[async_trait]
impl LineageRepository for LocalRepository {
    async fn list_derived(&self, source: DataId) -> RepositoryResult<Vec<DatasetInfo>> {
        self.check_health("list_derived")?;
        let data = self.data.read();
        if !data.datasets.contains_key(&source) {
            return Err(Self::not_found(source, "list_derived"));
        }
        Ok(data
            .datasets
            .values()
            .filter(|stored| stored.info.derived_from == Some(source))
            .map(|stored| stored.info.clone())
            .collect())
    }

    async fn lineage(&self, data_id: DataId) -> RepositoryResult<Vec<DataId>> {
        self.check_health("lineage")?;
        let data = self.data.read();
        let mut chain = Vec::new();
        let mut current = Some(data_id);
        while let Some(id) = current {
            let stored = data
                .datasets
                .get(&id)
                .ok_or_else(|| Self::not_found(id, "lineage"))?;
            chain.push(id);
            current = stored.info.derived_from;
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dataset, IrradianceUnit, Record};
    use chrono::NaiveDate;

    fn sample(n: usize) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let records = (0..n)
            .map(|i| {
                let ts = start + chrono::Duration::hours(i as i64);
                Record::new(ts, 100.0 + i as f64, 20.0, 5.0 + i as f64)
            })
            .collect();
        Dataset::new(Vec::new(), records)
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let repo = LocalRepository::new();
        let outcome = repo
            .store_dataset(NewDataset::new("site.csv", sample(3)).with_unit(IrradianceUnit::MjPerM2))
            .await
            .unwrap();
        assert!(!outcome.duplicate);
        assert_eq!(outcome.info.data_id, DataId(1));
        assert_eq!(outcome.info.rows, 3);

        let stored = repo.get_dataset(outcome.info.data_id).await.unwrap();
        assert_eq!(stored.dataset.len(), 3);
        assert_eq!(stored.info.irradiance_unit, IrradianceUnit::MjPerM2);
    }

    #[tokio::test]
    async fn test_duplicate_upload_reuses_id() {
        let repo = LocalRepository::new();
        let first = repo.store_dataset(NewDataset::new("a.csv", sample(2))).await.unwrap();
        let second = repo.store_dataset(NewDataset::new("a.csv", sample(2))).await.unwrap();
        assert!(second.duplicate);
        assert_eq!(first.info.data_id, second.info.data_id);
        assert_eq!(repo.dataset_count(), 1);

        let other = repo.store_dataset(NewDataset::new("b.csv", sample(2))).await.unwrap();
        assert!(!other.duplicate);
        assert_eq!(repo.dataset_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_dataset_rejected() {
        let repo = LocalRepository::new();
        let err = repo
            .store_dataset(NewDataset::new("empty.csv", Dataset::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_get_missing_dataset() {
        let repo = LocalRepository::new();
        let err = repo.get_dataset(DataId(42)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(err.context().entity_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_get_by_name_returns_latest() {
        let repo = LocalRepository::new();
        repo.store_dataset(NewDataset::new("site.csv", sample(2))).await.unwrap();
        let latest = repo.store_dataset(NewDataset::new("site.csv", sample(4))).await.unwrap();
        let stored = repo.get_dataset_by_name("site.csv").await.unwrap();
        assert_eq!(stored.info.data_id, latest.info.data_id);
        assert!(repo.get_dataset_by_name("nope.csv").await.is_err());
    }

    #[tokio::test]
    async fn test_lineage() {
        let repo = LocalRepository::new();
        let raw = repo.store_dataset(NewDataset::new("raw.csv", sample(5))).await.unwrap();
        let cleaned = repo
            .store_dataset(NewDataset::new("raw_cleaned.csv", sample(4)).derived_from(raw.info.data_id))
            .await
            .unwrap();

        let derived = repo.list_derived(raw.info.data_id).await.unwrap();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].data_id, cleaned.info.data_id);

        let chain = repo.lineage(cleaned.info.data_id).await.unwrap();
        assert_eq!(chain, vec![cleaned.info.data_id, raw.info.data_id]);
    }

    #[tokio::test]
    async fn test_derived_from_unknown_source() {
        let repo = LocalRepository::new();
        let err = repo
            .store_dataset(NewDataset::new("x.csv", sample(2)).derived_from(DataId(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unhealthy_repository() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_datasets().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_clear_resets_ids() {
        let repo = LocalRepository::new();
        repo.store_dataset(NewDataset::new("a.csv", sample(2))).await.unwrap();
        repo.clear();
        assert_eq!(repo.dataset_count(), 0);
        let again = repo.store_dataset(NewDataset::new("a.csv", sample(2))).await.unwrap();
        assert_eq!(again.info.data_id, DataId(1));
    }
}
