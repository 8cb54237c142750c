//! Dataset storage.
//!
//! - [`repository`]: async repository traits and error types
//! - [`repositories`]: concrete implementations (in-memory)
//! - [`services`]: backend-agnostic operations with logging
//! - [`checksum`]: content hashing for deduplication

pub mod checksum;
pub mod models;
pub mod repositories;
pub mod repository;
pub mod services;

pub use models::{NewDataset, StoreOutcome, StoredDataset};
pub use repositories::LocalRepository;
pub use repository::{
    DatasetRepository, ErrorContext, FullRepository, LineageRepository, RepositoryError,
    RepositoryResult,
};
