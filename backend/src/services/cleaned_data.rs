//! `POST /save-cleaned-data` orchestration.

use log::info;

use super::run_blocking;
use super::visualize::DEFAULT_OUTLIER_METHOD;
use crate::algorithms::OutlierPolicy;
use crate::api::{SaveCleanedRequest, SaveCleanedResponse};
use crate::config::PipelineSettings;
use crate::db::models::NewDataset;
use crate::db::repository::FullRepository;
use crate::db::services as db_services;
use crate::error::{CleaningResult, ServiceResult};
use crate::preprocessing::{PipelineOptions, StagePipeline};
use crate::routes::cleaning::CLEANED_PREFIX;

/// Name under which the cleaned copy of `file_name` is stored.
pub fn cleaned_file_name(file_name: &str) -> String {
    format!("{}{}", CLEANED_PREFIX, file_name)
}

/// Options for a save request. GI/TM adjustment always runs before saving.
pub fn cleaning_options(
    request: &SaveCleanedRequest,
    settings: &PipelineSettings,
) -> CleaningResult<PipelineOptions> {
    let mut params = settings.policy_params();
    if let Some(factor) = request.iqr_factor {
        params.iqr_factor = factor;
    }
    if let Some(threshold) = request.z_threshold {
        params.zscore_threshold = threshold;
    }
    if let Some(contamination) = request.isolation_contamination {
        params.isolation.contamination = contamination;
    }
    if let Some(seed) = request.seed {
        params.isolation.seed = seed;
    }

    let policy = match request.outlier_method.as_deref() {
        Some(method) => OutlierPolicy::from_method(method, &params)?,
        None if request.apply_outlier => {
            OutlierPolicy::from_method(DEFAULT_OUTLIER_METHOD, &params)?
        }
        None => OutlierPolicy::None,
    };

    let options = PipelineOptions {
        apply_gi_tm: true,
        apply_outlier: request.apply_outlier,
        policy,
        tm_fill: settings.tm_fill,
        bins: settings.histogram_bins,
        ..PipelineOptions::default()
    };
    options.validate()?;
    Ok(options)
}

/// Clean the latest dataset named `request.file_name` and store the
/// `outlier_removed` stage as a new dataset linked to its source.
///
/// A cleaning run that removes every record is rejected by the repository
/// as a validation error.
pub async fn save_cleaned_data<R: FullRepository + ?Sized>(
    repo: &R,
    request: SaveCleanedRequest,
    settings: &PipelineSettings,
) -> ServiceResult<SaveCleanedResponse> {
    let source = db_services::get_dataset_by_name(repo, &request.file_name).await?;
    let options = cleaning_options(&request, settings)?;
    let source_rows = source.dataset.len();

    let raw = source.dataset;
    let (cleaned, _mask) =
        run_blocking(move || Ok(StagePipeline::with_options(options).outlier_removed(&raw)?))
            .await?;

    let new_file_name = cleaned_file_name(&request.file_name);
    let rows_after_cleaning = cleaned.len();
    let outcome = db_services::store_dataset(
        repo,
        NewDataset::new(new_file_name.clone(), cleaned)
            .with_site(source.info.site_id)
            .with_unit(source.info.irradiance_unit)
            .derived_from(source.info.data_id),
    )
    .await?;

    info!(
        "Saved '{}' from dataset {}: {} of {} rows kept",
        new_file_name, source.info.data_id, rows_after_cleaning, source_rows
    );

    Ok(SaveCleanedResponse {
        new_file_name,
        rows_after_cleaning,
        data_id: outcome.info.data_id,
        removed_rows: source_rows - rows_after_cleaning,
    })
}
