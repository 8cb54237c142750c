//! Domain primitives shared by the pipeline, the repository and the HTTP layer.

pub mod dataset;
pub mod macros;
pub mod stage;
pub mod units;

pub use dataset::*;
pub use stage::Stage;
pub use units::*;

crate::define_id_type!(i64, DataId);
crate::define_id_type!(i64, SiteId);
