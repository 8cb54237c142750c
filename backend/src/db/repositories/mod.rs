//! Repository implementations.
//!
//! - `local`: In-memory implementation used by the server and the tests

pub mod local;

pub use local::LocalRepository;
