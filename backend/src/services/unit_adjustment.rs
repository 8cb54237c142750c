//! `POST /units/irradiance/convert` orchestration.

use crate::api::{ConvertRequest, ConvertResponse};
use crate::db::repository::FullRepository;
use crate::db::services as db_services;
use crate::error::{CleaningError, ServiceResult};
use crate::models::{convert, Dataset, IrradianceUnit};

/// GI of the chronologically first record, before and after conversion to
/// kWh/m². Both are `None` for an empty dataset.
pub fn preview_conversion(dataset: &Dataset, from: IrradianceUnit) -> (Option<f64>, Option<f64>) {
    let first = dataset
        .records()
        .iter()
        .min_by_key(|record| record.timestamp);
    match first {
        Some(record) => (
            Some(record.gi),
            Some(convert(record.gi, from, IrradianceUnit::CANONICAL)),
        ),
        None => (None, None),
    }
}

/// Report the conversion factor for `from_unit`, previewed on the latest
/// dataset named `file_name` when one is given.
pub async fn convert_irradiance<R: FullRepository + ?Sized>(
    repo: &R,
    request: ConvertRequest,
) -> ServiceResult<ConvertResponse> {
    let from_unit = request
        .from_unit
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| CleaningError::invalid_parameter("from_unit", "is required"))?;
    let from: IrradianceUnit = from_unit.parse()?;

    let (preview_original, preview_converted) = match request.file_name.as_deref() {
        Some(file_name) => {
            let stored = db_services::get_dataset_by_name(repo, file_name).await?;
            preview_conversion(&stored.dataset, from)
        }
        None => (None, None),
    };

    Ok(ConvertResponse {
        from_unit: from.symbol().to_string(),
        to_unit: IrradianceUnit::CANONICAL.symbol().to_string(),
        factor_to_kwh: from.factor_to_kwh(),
        preview_original,
        preview_converted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewDataset;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::DatasetRepository;
    use crate::error::ServiceError;
    use crate::models::Record;
    use chrono::NaiveDate;

    fn dataset() -> Dataset {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        // stored out of order; the preview must pick 06:00
        Dataset::new(
            Vec::new(),
            vec![
                Record::new(day.and_hms_opt(9, 0, 0).unwrap(), 7.2, 25.0, 3.0),
                Record::new(day.and_hms_opt(6, 0, 0).unwrap(), 3.6, 18.0, 1.0),
            ],
        )
    }

    #[test]
    fn test_preview_uses_earliest_record() {
        let (original, converted) = preview_conversion(&dataset(), IrradianceUnit::MjPerM2);
        assert_eq!(original, Some(3.6));
        assert!((converted.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_preview_empty_dataset() {
        assert_eq!(
            preview_conversion(&Dataset::default(), IrradianceUnit::WhPerM2),
            (None, None)
        );
    }

    #[tokio::test]
    async fn test_convert_without_file() {
        let repo = LocalRepository::new();
        let resp = convert_irradiance(
            &repo,
            ConvertRequest {
                from_unit: Some("Wh/m²".into()),
                file_name: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.to_unit, "kWh/m²");
        assert_eq!(resp.factor_to_kwh, 0.001);
        assert!(resp.preview_original.is_none());
    }

    #[tokio::test]
    async fn test_convert_with_file() {
        let repo = LocalRepository::new();
        repo.store_dataset(NewDataset::new("site.csv", dataset()))
            .await
            .unwrap();
        let resp = convert_irradiance(
            &repo,
            ConvertRequest {
                from_unit: Some("MJ/m2".into()),
                file_name: Some("site.csv".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(resp.from_unit, "MJ/m²");
        assert_eq!(resp.preview_original, Some(3.6));
    }

    #[tokio::test]
    async fn test_missing_and_unknown_unit() {
        let repo = LocalRepository::new();
        let err = convert_irradiance(&repo, ConvertRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Cleaning(CleaningError::InvalidParameter { .. })
        ));

        let err = convert_irradiance(
            &repo,
            ConvertRequest {
                from_unit: Some("BTU/ft²".into()),
                file_name: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Cleaning(CleaningError::UnknownUnit(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_file_is_not_found() {
        let repo = LocalRepository::new();
        let err = convert_irradiance(
            &repo,
            ConvertRequest {
                from_unit: Some("kWh/m²".into()),
                file_name: Some("missing.csv".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Repository(_)));
    }
}
