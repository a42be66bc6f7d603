//! Dataset Verification Integration Tests
//!
//! Exercise startup verification against dataset files on disk: the checks
//! the `verify` subcommand runs before a new dataset file is deployed.

mod common;

use climate_service::db;
use climate_service::model::QueryError;
use climate_service::verify::{verify_dataset, VerificationStatus};
use common::dataset_file;

#[test]
fn test_verification_report_for_clean_dataset() {
    let fixture = dataset_file(
        &[("USC00519397", "WAIKIKI 717.2, HI US"), ("USC00519281", "WAIHEE 837.5, HI US")],
        &[
            ("USC00519397", "2010-01-01", Some(0.08), Some(65.0)),
            ("USC00519281", "2017-08-23", None, None),
        ],
    );

    let dataset = db::connect_and_verify(&fixture.path).expect("dataset should verify");
    let report = dataset.with_session(verify_dataset).expect("report should build");

    println!("\n{}", serde_json::to_string_pretty(&report).unwrap());

    assert_eq!(report.status, VerificationStatus::Success);
    assert_eq!(report.station_count, 2);
    assert_eq!(report.measurement_count, 2);
    assert_eq!(report.first_date.as_deref(), Some("2010-01-01"));
    assert_eq!(report.last_date.as_deref(), Some("2017-08-23"));
    assert_eq!(report.missing_precipitation, 1);
    assert_eq!(report.missing_temperature, 1);
}

#[test]
fn test_verification_flags_orphan_measurements() {
    let fixture = dataset_file(
        &[("USC00519397", "WAIKIKI 717.2, HI US")],
        &[
            ("USC00519397", "2017-08-23", Some(0.0), Some(81.0)),
            ("USC00000000", "2017-08-23", Some(0.0), Some(81.0)),
        ],
    );

    let dataset = db::connect_and_verify(&fixture.path).unwrap();
    let report = dataset.with_session(verify_dataset).unwrap();

    assert_eq!(report.status, VerificationStatus::PartialSuccess);
    assert_eq!(report.orphan_measurements, 1);
    assert_eq!(report.issues, ["1 measurement(s) reference an unknown station"]);
}

#[test]
fn test_non_sqlite_file_is_rejected_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hawaii.sqlite");
    std::fs::write(&path, "date,prcp,tobs\n2017-08-23,0.0,81\n").unwrap();

    let result = db::connect_and_verify(&path);
    assert!(
        matches!(result, Err(QueryError::Storage(_))),
        "a CSV file is not a dataset, got {:?}",
        result
    );
}
