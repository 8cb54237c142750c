//! Numeric kernels: descriptive statistics and outlier detection.

pub mod isolation_forest;
pub mod outliers;
pub mod statistics;

pub use isolation_forest::{isolation_forest_mask, IsolationForest, IsolationForestParams};
pub use outliers::{
    detect, detect_column, detect_records, iqr_fences, iqr_mask, zscore_mask, CombineMode, Detection,
    OutlierPolicy, PolicyParams, DEFAULT_WHISKER_FACTOR, IQR_MIN_POINTS,
};
pub use statistics::{
    describe, mean, min_max, pearson, quantile, quantile_sorted, quartiles, sample_std, sorted_finite,
    Describe,
};
