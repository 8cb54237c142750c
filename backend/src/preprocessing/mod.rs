pub mod adjustment;
pub mod pipeline;
pub mod validator;


pub use adjustment::{adjust_gi_tm, Adjustment, TmFill};
pub use pipeline::{
    compute_stages, PipelineMetadata, PipelineOptions, StagePipeline, StageSet, StageSnapshot,
    MAX_HISTOGRAM_BINS,
};
pub use validator::{SchemaValidator, TimeSource, ValidatedUpload, ValidationStats};
