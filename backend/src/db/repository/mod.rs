//! Repository trait definitions for dataset storage.
//!
//! - [`error`]: Error types for repository operations
//! - [`dataset`]: Upload storage, lookup and listing
//! - [`lineage`]: Links between cleaned datasets and their sources
//!
//! For functions that need every capability, use the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let stored = repo.get_dataset(data_id).await?;
//!     let children = repo.list_derived(data_id).await?;
//!     Ok(())
//! }
//! ```

pub mod dataset;
pub mod error;
pub mod lineage;

pub use dataset::DatasetRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use lineage::LineageRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type implementing every repository trait.
pub trait FullRepository: DatasetRepository + LineageRepository {}

impl<T> FullRepository for T where T: DatasetRepository + LineageRepository {}
