//! End-to-end pipeline tests: upload text through validation and all stages.

mod support;

use proptest::prelude::*;
use sfp_rust::algorithms::OutlierPolicy;
use sfp_rust::error::{CleaningError, PipelineWarning};
use sfp_rust::models::{convert, Column, IrradianceUnit, Stage};
use sfp_rust::parsing::{parse_csv_str, parse_records_json_str};
use sfp_rust::preprocessing::{compute_stages, PipelineOptions, SchemaValidator, TimeSource};
use sfp_rust::services::{boxplot_by, Grouping};

fn validated(csv: &str) -> sfp_rust::models::Dataset {
    let table = parse_csv_str(csv).unwrap();
    SchemaValidator::validate(&table).unwrap().dataset
}

fn full_options(policy: OutlierPolicy) -> PipelineOptions {
    PipelineOptions {
        apply_gi_tm: true,
        apply_outlier: true,
        policy,
        ..Default::default()
    }
}

#[test]
fn test_csv_upload_through_all_stages() {
    let csv = support::site_csv(72, Some(12));
    let table = parse_csv_str(&csv).unwrap();
    let upload = SchemaValidator::validate(&table).unwrap();
    assert_eq!(upload.stats.time_source, TimeSource::DateHour);
    assert_eq!(upload.dataset.len(), 72);

    let stages = compute_stages(
        &upload.dataset,
        &full_options(OutlierPolicy::Iqr { factor: 1.5 }),
    )
    .unwrap();

    // 13 daylight hours per day survive the GI filter
    assert_eq!(stages.gi_tm_adjusted.dataset.len(), 39);
    assert!(stages
        .gi_tm_adjusted
        .dataset
        .values(Column::Tm)
        .iter()
        .all(|tm| *tm != 0.0));
    assert!(stages
        .gi_tm_adjusted
        .dataset
        .values(Column::Gi)
        .iter()
        .all(|gi| *gi != 0.0));

    // the spike is the first daylight record at noon
    let spike_index = stages
        .gi_tm_adjusted
        .dataset
        .records()
        .iter()
        .position(|r| r.eac > 100.0)
        .unwrap();
    assert!(stages.outlier_mask[spike_index]);
    assert!(stages
        .outlier_removed
        .dataset
        .values(Column::Eac)
        .iter()
        .all(|v| *v < 100.0));

    assert_eq!(
        stages.outlier_removed.dataset.len() + stages.removed_count(),
        stages.gi_tm_adjusted.dataset.len()
    );
}

#[test]
fn test_json_records_match_csv_upload() {
    let json = r#"[
        {"date": "2024-05-01", "hour": 10, "GI": 500, "TM": 21.5, "EAC": 3.5},
        {"date": "2024-05-01", "hour": 11, "GI": 620, "TM": 23.0, "EAC": 4.2}
    ]"#;
    let csv = "date,hour,GI,TM,EAC\n2024-05-01,10,500,21.5,3.5\n2024-05-01,11,620,23.0,4.2\n";
    let from_json = SchemaValidator::validate(&parse_records_json_str(json).unwrap())
        .unwrap()
        .dataset;
    assert_eq!(from_json, validated(csv));
}

#[test]
fn test_missing_column_rejects_upload() {
    let table = parse_csv_str("timestamp,GI,EAC\n2024-01-01 00:00,1,2\n").unwrap();
    let err = SchemaValidator::validate(&table).unwrap_err();
    assert_eq!(
        err,
        CleaningError::MissingColumn {
            column: "TM".to_string()
        }
    );
}

#[test]
fn test_ordering_rejection() {
    let dataset = validated(&support::site_csv(24, None));
    let options = PipelineOptions {
        apply_gi_tm: false,
        apply_outlier: true,
        policy: OutlierPolicy::Iqr { factor: 1.5 },
        ..Default::default()
    };
    let err = compute_stages(&dataset, &options).unwrap_err();
    assert!(matches!(err, CleaningError::StageOrder { missing, .. } if missing == "gi_tm_adjusted"));
}

#[test]
fn test_idempotent_with_isolation_forest() {
    let dataset = validated(&support::site_csv(96, Some(36)));
    let options = full_options(OutlierPolicy::from_method("isolation_forest", &Default::default()).unwrap());
    let first = compute_stages(&dataset, &options).unwrap();
    let second = compute_stages(&dataset, &options).unwrap();
    assert_eq!(first.outlier_mask, second.outlier_mask);
    assert_eq!(first.outlier_removed.dataset, second.outlier_removed.dataset);
    assert_eq!(first.outlier_removed.artifacts, second.outlier_removed.artifacts);
}

#[test]
fn test_all_night_upload_yields_empty_stages() {
    let csv = "date,hour,GI,TM,EAC\n2024-01-01,0,0,5,0\n2024-01-01,1,0,5,0\n";
    let stages = compute_stages(&validated(csv), &full_options(OutlierPolicy::Iqr { factor: 1.5 })).unwrap();

    assert!(stages.gi_tm_adjusted.no_data);
    assert!(stages.outlier_removed.no_data);
    assert!(stages.warnings.contains(&PipelineWarning::EmptyStage {
        stage: Stage::GiTmAdjusted
    }));
    let hours = &stages.outlier_removed.artifacts.boxplot_by_hour;
    assert_eq!(hours.len(), 24);
    assert!(hours.values().all(|g| g.count == 0));
}

#[test]
fn test_hour_grouping_of_empty_dataset_is_complete() {
    let groups = boxplot_by(&Default::default(), Grouping::Hour, Column::Eac, 1.5);
    assert_eq!(groups.len(), 24);
    assert_eq!(groups.keys().copied().collect::<Vec<_>>(), (0..24).collect::<Vec<_>>());
}

#[test]
fn test_zero_variance_zscore_column() {
    let mut csv = String::from("timestamp,GI,TM,EAC\n");
    for i in 0..100 {
        csv.push_str(&format!("2024-02-{:02} {:02}:00,500,20,7\n", 1 + i / 24, i % 24));
    }
    let dataset = validated(&csv);
    let options = full_options(OutlierPolicy::ZScore { threshold: 3.0 });
    let stages = compute_stages(&dataset, &options).unwrap();
    assert!(stages.outlier_mask.iter().all(|m| !m));
    assert!(stages
        .warnings
        .iter()
        .any(|w| matches!(w, PipelineWarning::ZeroVariance { .. })));
}

#[test]
fn test_metadata_reports_unit_factor() {
    let dataset = validated(&support::site_csv(24, None));
    let options = PipelineOptions {
        irradiance_unit: IrradianceUnit::MjPerM2,
        ..Default::default()
    };
    let stages = compute_stages(&dataset, &options).unwrap();
    assert!((stages.metadata.factor_to_kwh - 1.0 / 3.6).abs() < 1e-12);
    // stored values are untouched
    assert_eq!(stages.raw.dataset, dataset);
}

proptest! {
    #[test]
    fn prop_unit_round_trip(x in -1.0e6f64..1.0e6) {
        let mj = convert(x, IrradianceUnit::KwhPerM2, IrradianceUnit::MjPerM2);
        let back = convert(mj, IrradianceUnit::MjPerM2, IrradianceUnit::KwhPerM2);
        prop_assert!((back - x).abs() <= 1e-9 * x.abs().max(1.0));
    }
}
