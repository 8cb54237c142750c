//! `GET /visualize` orchestration.

use log::debug;
use std::collections::BTreeMap;
use std::time::Instant;

use super::run_blocking;
use crate::algorithms::{describe, OutlierPolicy};
use crate::api::{StagesView, VisualizeData, VisualizeQuery};
use crate::config::PipelineSettings;
use crate::db::repository::FullRepository;
use crate::db::services as db_services;
use crate::error::{CleaningResult, ServiceResult};
use crate::models::{DataId, Dataset, IrradianceUnit};
use crate::preprocessing::{compute_stages, PipelineOptions};

/// Method used when outlier removal is requested without naming one.
pub const DEFAULT_OUTLIER_METHOD: &str = "iqr";

/// Resolve query parameters against the configured defaults.
///
/// An explicit `outlier_method` is parsed and validated even when outlier
/// removal is off, so typos surface as errors instead of being ignored.
pub fn pipeline_options(
    query: &VisualizeQuery,
    settings: &PipelineSettings,
    stored_unit: IrradianceUnit,
) -> CleaningResult<PipelineOptions> {
    let (apply_gi_tm, apply_outlier) = query.stage_flags();

    let mut params = settings.policy_params();
    if let Some(factor) = query.iqr_factor {
        params.iqr_factor = factor;
    }
    if let Some(threshold) = query.zscore_threshold {
        params.zscore_threshold = threshold;
    }
    if let Some(contamination) = query.isolation_contamination {
        params.isolation.contamination = contamination;
    }
    if let Some(seed) = query.seed {
        params.isolation.seed = seed;
    }

    let policy = match query.outlier_method.as_deref() {
        Some(method) => OutlierPolicy::from_method(method, &params)?,
        None if apply_outlier => OutlierPolicy::from_method(DEFAULT_OUTLIER_METHOD, &params)?,
        None => OutlierPolicy::None,
    };

    let irradiance_unit = match query.irradiance_unit.as_deref() {
        Some(unit) => unit.parse()?,
        None => stored_unit,
    };

    let options = PipelineOptions {
        apply_gi_tm,
        apply_outlier,
        policy,
        tm_fill: settings.tm_fill,
        bins: query.bins.unwrap_or(settings.histogram_bins),
        irradiance_unit,
        ..PipelineOptions::default()
    };
    options.validate()?;
    Ok(options)
}

/// Run the pipeline on `raw` and shape the response.
///
/// `stats` and `sample` describe the `outlier_removed` stage, which equals
/// the most processed stage the options enabled.
pub fn build_visualize_data(
    data_id: DataId,
    raw: &Dataset,
    options: &PipelineOptions,
    sample_rows: usize,
) -> CleaningResult<VisualizeData> {
    let start = Instant::now();
    let stages = compute_stages(raw, options)?;

    let processed = &stages.outlier_removed.dataset;
    let stats = processed
        .numeric_columns()
        .into_iter()
        .filter_map(|name| {
            let values = processed.numeric_values(&name)?;
            Some((name, describe(&values)))
        })
        .collect::<BTreeMap<_, _>>();
    let sample = processed.head_json(sample_rows);

    debug!(
        "Visualize dataset {}: {} raw rows, {} after cleaning, {:?}",
        data_id,
        raw.len(),
        processed.len(),
        start.elapsed()
    );

    Ok(VisualizeData {
        data_id,
        stages: StagesView {
            raw: stages.raw.view(),
            gi_tm_adjusted: stages.gi_tm_adjusted.view(),
            outlier_removed: stages.outlier_removed.view(),
        },
        outlier_mask: stages.outlier_mask,
        columns: raw.column_names(),
        stats,
        sample,
        warnings: stages.warnings,
        metadata: stages.metadata,
    })
}

/// Load the dataset and run [`build_visualize_data`] on a blocking thread.
pub async fn get_visualize_data<R: FullRepository + ?Sized>(
    repo: &R,
    query: VisualizeQuery,
    settings: &PipelineSettings,
) -> ServiceResult<VisualizeData> {
    let stored = db_services::get_dataset(repo, query.data_id).await?;
    let options = pipeline_options(&query, settings, stored.info.irradiance_unit)?;
    let sample_rows = settings.sample_rows;
    let data_id = query.data_id;

    run_blocking(move || {
        Ok(build_visualize_data(
            data_id,
            &stored.dataset,
            &options,
            sample_rows,
        )?)
    })
    .await
}
