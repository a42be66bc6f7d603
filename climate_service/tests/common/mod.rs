//! Fixture helpers shared by the integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use climate_service::api::{self, AppState};
use climate_service::config::ServiceConfig;
use climate_service::db::{self, SCHEMA_SQL};
use http_body_util::BodyExt;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

/// (station code, name)
pub type StationRow<'a> = (&'a str, &'a str);

/// (station code, date, prcp, tobs)
pub type MeasurementRow<'a> = (&'a str, &'a str, Option<f64>, Option<f64>);

/// A dataset file in a temporary directory. The directory, and the file
/// with it, is removed when this is dropped.
pub struct DatasetFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

pub fn dataset_file(stations: &[StationRow], measurements: &[MeasurementRow]) -> DatasetFixture {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("hawaii.sqlite");

    let conn = Connection::open(&path).expect("should create dataset file");
    conn.execute_batch(SCHEMA_SQL).expect("schema should apply");
    for (code, name) in stations {
        conn.execute(
            "INSERT INTO station (station, name, latitude, longitude, elevation)
             VALUES (?1, ?2, 21.2716, -157.8168, 3.0)",
            params![code, name],
        )
        .expect("station row should insert");
    }
    for (code, date, prcp, tobs) in measurements {
        conn.execute(
            "INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)",
            params![code, date, prcp, tobs],
        )
        .expect("measurement row should insert");
    }

    DatasetFixture { dir, path }
}

pub fn app_for(fixture: &DatasetFixture) -> Router {
    let dataset = db::connect_and_verify(&fixture.path).expect("fixture dataset should verify");
    api::router(AppState::new(dataset, &ServiceConfig::default()))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body should be UTF-8")
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app.clone().oneshot(request).await.expect("router is infallible");

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec();

    TestResponse { status, content_type, body }
}
