//! HTTP surface of the climate query service.
//!
//! | Path | Response |
//! |---|---|
//! | `/` | HTML index of the routes below |
//! | `/api/v1.0/precipitation` | trailing-window `{date, rainfall}` series |
//! | `/api/v1.0/stations` | station names |
//! | `/api/v1.0/tobs` | most active station's trailing-window temperatures |
//! | `/api/v1.0/user_dates/{start_date}[/{end_date}]` | `{min, avg, max}` temperature |
//!
//! Handlers never touch SQLite on the async runtime: each query runs on the
//! blocking pool inside a session scoped to that one request.

use crate::config::ServiceConfig;
use crate::db::Dataset;
use crate::logging::{self, LogSource};
use crate::model::{DateRange, QueryError, RainfallRecord, TemperatureStats};
use crate::queries;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::Connection;
use std::sync::Arc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared by every handler. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dataset: Dataset,
    pub window_days: u32,
    pub open_end_sentinel: Arc<str>,
}

impl AppState {
    pub fn new(dataset: Dataset, config: &ServiceConfig) -> Self {
        Self {
            dataset,
            window_days: config.window_days,
            open_end_sentinel: Arc::from(config.open_end_sentinel.as_str()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/api/v1.0/precipitation", get(handle_precipitation))
        .route("/api/v1.0/stations", get(handle_stations))
        .route("/api/v1.0/tobs", get(handle_tobs))
        .route("/api/v1.0/user_dates/{start_date}", get(handle_user_dates_open))
        .route(
            "/api/v1.0/user_dates/{start_date}/{end_date}",
            get(handle_user_dates),
        )
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Query worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Query(QueryError::MalformedInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Query(_) | ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Runs `query` on the blocking pool with a session that is released before
/// this returns, on success and on failure alike.
async fn run_query<T, F>(state: &AppState, operation: &'static str, query: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, QueryError> + Send + 'static,
{
    let dataset = state.dataset.clone();
    let joined = tokio::task::spawn_blocking(move || dataset.with_session(query)).await;

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            logging::log_query_failure(operation, &err);
            Err(err.into())
        }
        Err(join_err) => {
            logging::error(
                LogSource::Http,
                None,
                &format!("{} worker failed: {}", operation, join_err),
            );
            Err(join_err.into())
        }
    }
}

// ---------------------------------------------------------------------------
// Route index
// ---------------------------------------------------------------------------

pub struct RouteInfo {
    pub path: &'static str,
    pub description: &'static str,
}

pub static ROUTES: &[RouteInfo] = &[
    RouteInfo {
        path: "/api/v1.0/precipitation",
        description: "Last 12 months of precipitation",
    },
    RouteInfo {
        path: "/api/v1.0/stations",
        description: "List of all stations",
    },
    RouteInfo {
        path: "/api/v1.0/tobs",
        description: "Last 12 months of temperatures for the most active station",
    },
    RouteInfo {
        path: "/api/v1.0/user_dates/{start_date}/{end_date}",
        description: "Min, average and max temperature between two dates (YYYY-MM-DD)",
    },
];

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
        .replace('"', "&quot;")
}

/// Renders the `/` page: one link per entry in `ROUTES`.
pub fn route_index_html(open_end_sentinel: &str) -> String {
    let mut html = String::from("List of Available Routes:<br/>\n");
    for route in ROUTES {
        html.push_str(&format!(
            "<a href='{path}'>{description}</a> <code>{path}</code><br/>\n",
            path = escape_html(route.path),
            description = escape_html(route.description),
        ));
    }
    html.push_str(&format!(
        "Use <code>{}</code> as the end date, or leave it off, for an open-ended range.<br/>\n",
        escape_html(open_end_sentinel)
    ));
    html
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(route_index_html(&state.open_end_sentinel))
}

async fn handle_precipitation(
    State(state): State<AppState>,
) -> Result<Json<Vec<RainfallRecord>>, ApiError> {
    let window_days = state.window_days;
    let records = run_query(&state, "precipitation", move |conn| {
        queries::recent_precipitation(conn, window_days)
    })
    .await?;

    logging::debug(
        LogSource::Http,
        None,
        &format!("precipitation: {} record(s)", records.len()),
    );
    Ok(Json(records))
}

async fn handle_stations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Option<String>>>, ApiError> {
    let names = run_query(&state, "stations", queries::station_names).await?;
    logging::debug(
        LogSource::Http,
        None,
        &format!("stations: {} name(s)", names.len()),
    );
    Ok(Json(names))
}

async fn handle_tobs(State(state): State<AppState>) -> Result<Json<Vec<Option<f64>>>, ApiError> {
    let window_days = state.window_days;
    let (series, station) = run_query(&state, "tobs", move |conn| {
        let series = queries::most_active_station_temperatures(conn, window_days)?;
        let station = queries::find_station(conn, &series.station.station)?;
        Ok((series, station))
    })
    .await?;

    let name = station
        .and_then(|s| s.name)
        .unwrap_or_else(|| "unregistered station".to_string());
    logging::debug(
        LogSource::Http,
        Some(&series.station.station),
        &format!(
            "tobs: {} value(s) from {} between {} and {}",
            series.temperatures.len(),
            name,
            series.first_date,
            series.last_date
        ),
    );
    Ok(Json(series.temperatures))
}

async fn handle_user_dates(
    State(state): State<AppState>,
    Path((start_date, end_date)): Path<(String, String)>,
) -> Result<Json<TemperatureStats>, ApiError> {
    let end_date = resolve_end_date(end_date, &state.open_end_sentinel);
    stats_for_range(&state, &start_date, end_date.as_deref()).await
}

async fn handle_user_dates_open(
    State(state): State<AppState>,
    Path(start_date): Path<String>,
) -> Result<Json<TemperatureStats>, ApiError> {
    stats_for_range(&state, &start_date, None).await
}

/// `None` when the path segment is the configured open-end sentinel.
fn resolve_end_date(segment: String, sentinel: &str) -> Option<String> {
    if segment.eq_ignore_ascii_case(sentinel) {
        None
    } else {
        Some(segment)
    }
}

async fn stats_for_range(
    state: &AppState,
    start_date: &str,
    end_date: Option<&str>,
) -> Result<Json<TemperatureStats>, ApiError> {
    let range = DateRange::parse(start_date, end_date).map_err(|err| {
        logging::log_query_failure("user_dates", &err);
        ApiError::from(err)
    })?;

    let stats = run_query(state, "user_dates", move |conn| {
        queries::temperature_stats(conn, &range)
    })
    .await?;
    Ok(Json(stats))
}
