//! Upload ingestion: parse, validate, store.

use anyhow::Context;
use log::{info, warn};
use std::path::Path;

use crate::api::{UploadDatasetRequest, UploadDatasetResponse};
use crate::db::models::NewDataset;
use crate::db::repository::FullRepository;
use crate::db::services as db_services;
use crate::error::{CleaningError, CleaningResult, ServiceResult};
use crate::models::IrradianceUnit;
use crate::parsing::{parse_csv_file, parse_csv_str, parse_records_value, RawTable};
use crate::preprocessing::SchemaValidator;

/// Turn the request body into a raw table. Exactly one of `csv` and
/// `records` must be set.
pub fn parse_upload(request: &UploadDatasetRequest) -> CleaningResult<RawTable> {
    match (&request.csv, &request.records) {
        (Some(csv), None) => parse_csv_str(csv),
        (None, Some(records)) => parse_records_value(records),
        (Some(_), Some(_)) => Err(CleaningError::invalid_parameter(
            "csv",
            "provide either 'csv' or 'records', not both",
        )),
        (None, None) => Err(CleaningError::invalid_parameter(
            "csv",
            "one of 'csv' or 'records' is required",
        )),
    }
}

/// Validate and store an upload.
pub async fn ingest_upload<R: FullRepository + ?Sized>(
    repo: &R,
    request: UploadDatasetRequest,
) -> ServiceResult<UploadDatasetResponse> {
    if request.file_name.trim().is_empty() {
        return Err(CleaningError::invalid_parameter("file_name", "must not be empty").into());
    }
    let irradiance_unit = match request.irradiance_unit.as_deref() {
        Some(unit) => unit.parse()?,
        None => IrradianceUnit::default(),
    };

    let table = parse_upload(&request)?;
    let validated = SchemaValidator::validate(&table)?;

    let outcome = db_services::store_dataset(
        repo,
        NewDataset::new(request.file_name.clone(), validated.dataset)
            .with_site(request.site_id)
            .with_unit(irradiance_unit),
    )
    .await?;

    Ok(UploadDatasetResponse {
        data_id: outcome.info.data_id,
        file_name: outcome.info.file_name,
        rows: outcome.info.rows,
        duplicate: outcome.duplicate,
        stats: validated.stats,
        warnings: validated.warnings,
    })
}

/// Store every `*.csv` file in `dir`, in file name order.
///
/// Files that fail validation are skipped with a warning; I/O errors abort.
/// Returns the number of datasets stored.
pub async fn preload_directory<R: FullRepository + ?Sized>(
    repo: &R,
    dir: &Path,
) -> anyhow::Result<usize> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read preload directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if path.is_file() && is_csv {
            paths.push(path);
        }
    }
    paths.sort();

    let mut stored = 0;
    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let table = parse_csv_file(&path)?;
        let validated = match SchemaValidator::validate(&table) {
            Ok(validated) => validated,
            Err(e) => {
                warn!("Skipping preload file {}: {}", path.display(), e);
                continue;
            }
        };
        db_services::store_dataset(repo, NewDataset::new(file_name, validated.dataset))
            .await
            .with_context(|| format!("Failed to store {}", path.display()))?;
        stored += 1;
    }

    info!("Preloaded {} datasets from {}", stored, dir.display());
    Ok(stored)
}
