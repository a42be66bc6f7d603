//! Dataset Verification Module
//!
//! Checks a dataset file against the assumptions the query layer makes:
//! the tables are populated, every measurement points at a known station,
//! and every stored date is a zero-padded `YYYY-MM-DD` string (string
//! comparison is only date comparison when that holds).
//!
//! Run through `climate_service verify` before pointing the service at a new
//! dataset file; the server also logs a summary at startup.

use crate::db::verify_schema;
use crate::model::QueryError;
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    pub timestamp: String,
    pub status: VerificationStatus,
    pub station_count: i64,
    pub measurement_count: i64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    /// Measurements whose station code has no row in `station`.
    pub orphan_measurements: i64,
    /// Stored dates that are not exactly `YYYY-MM-DD`.
    pub malformed_dates: i64,
    pub missing_precipitation: i64,
    pub missing_temperature: i64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Verification
// ============================================================================

pub fn verify_dataset(conn: &Connection) -> Result<DatasetReport, QueryError> {
    verify_schema(conn)?;

    let station_count = count(conn, "SELECT COUNT(*) FROM station")?;
    let measurement_count = count(conn, "SELECT COUNT(*) FROM measurement")?;
    let orphan_measurements = count(
        conn,
        "SELECT COUNT(*) FROM measurement m
         WHERE NOT EXISTS (SELECT 1 FROM station s WHERE s.station = m.station)",
    )?;
    // GLOB keeps the shape check in SQL; calendar validity is left to parsing.
    let malformed_dates = count(
        conn,
        "SELECT COUNT(*) FROM measurement
         WHERE date IS NULL
            OR date NOT GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]'",
    )?;
    let missing_precipitation =
        count(conn, "SELECT COUNT(*) FROM measurement WHERE prcp IS NULL")?;
    let missing_temperature =
        count(conn, "SELECT COUNT(*) FROM measurement WHERE tobs IS NULL")?;

    let (first_date, last_date): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(date), MAX(date) FROM measurement",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let mut issues = Vec::new();
    if station_count == 0 {
        issues.push("station table is empty".to_string());
    }
    if measurement_count == 0 {
        issues.push("measurement table is empty".to_string());
    }
    if orphan_measurements > 0 {
        issues.push(format!(
            "{} measurement(s) reference an unknown station",
            orphan_measurements
        ));
    }
    if malformed_dates > 0 {
        issues.push(format!(
            "{} measurement(s) have a date not in YYYY-MM-DD form",
            malformed_dates
        ));
    }

    let status = if measurement_count == 0 {
        VerificationStatus::Failed
    } else if issues.is_empty() {
        VerificationStatus::Success
    } else {
        VerificationStatus::PartialSuccess
    };

    Ok(DatasetReport {
        timestamp: Utc::now().to_rfc3339(),
        status,
        station_count,
        measurement_count,
        first_date,
        last_date,
        orphan_measurements,
        malformed_dates,
        missing_precipitation,
        missing_temperature,
        issues,
    })
}

fn count(conn: &Connection, sql: &str) -> Result<i64, QueryError> {
    Ok(conn.query_row(sql, [], |row| row.get(0))?)
}
