//! Read operations over the climate dataset.
//!
//! Each function takes a borrowed connection and issues one or more
//! read-only statements against it; none of them keep state between calls.
//! Dates are compared as `YYYY-MM-DD` strings in SQL, which matches
//! chronological order because the format is fixed-width.
//!
//! Ordering is always explicit so repeated calls return identical results:
//! - precipitation rows by date, then station code, then row id
//! - station names by station code, then row id
//! - temperature series by date, then row id
//! - most active station ties go to the lowest station code

use crate::model::{
    format_iso_date, parse_stored_date, window_start, DateRange, MostActiveStation,
    QueryError, RainfallRecord, Station, TemperatureStats,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

// ---------------------------------------------------------------------------
// Date lookups
// ---------------------------------------------------------------------------

/// Most recent observation date across all stations.
pub fn latest_date(conn: &Connection) -> Result<NaiveDate, QueryError> {
    let latest: Option<String> =
        conn.query_row("SELECT MAX(date) FROM measurement", [], |row| row.get(0))?;
    match latest {
        Some(date) => parse_stored_date(&date),
        None => Err(QueryError::NoData("measurement table is empty")),
    }
}

/// Most recent observation date for one station.
pub fn station_latest_date(conn: &Connection, station: &str) -> Result<NaiveDate, QueryError> {
    let latest: Option<String> = conn.query_row(
        "SELECT MAX(date) FROM measurement WHERE station = ?1",
        [station],
        |row| row.get(0),
    )?;
    match latest {
        Some(date) => parse_stored_date(&date),
        None => Err(QueryError::NoData("station has no measurements")),
    }
}

// ---------------------------------------------------------------------------
// Precipitation
// ---------------------------------------------------------------------------

/// Every `(date, prcp)` row in the trailing window ending at the dataset's
/// latest date, both ends inclusive. One record per row; days reported by
/// several stations appear several times.
pub fn recent_precipitation(
    conn: &Connection,
    window_days: u32,
) -> Result<Vec<RainfallRecord>, QueryError> {
    let last = latest_date(conn)?;
    let first = window_start(last, window_days);

    let mut stmt = conn.prepare(
        "SELECT date, prcp FROM measurement
         WHERE date >= ?1 AND date <= ?2
         ORDER BY date, station, id",
    )?;
    let records = stmt
        .query_map(params![format_iso_date(first), format_iso_date(last)], |row| {
            let date: String = row.get(0)?;
            let rainfall: Option<f64> = row.get(1)?;
            Ok(RainfallRecord { date, rainfall })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// Name of every station row. Duplicate names are kept, and a row without a
/// name still yields an entry (`None`).
pub fn station_names(conn: &Connection) -> Result<Vec<Option<String>>, QueryError> {
    let mut stmt = conn.prepare("SELECT name FROM station ORDER BY station, id")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<Option<String>>, _>>()?;
    Ok(names)
}

/// Looks up a station by code. Returns `None` if not found.
pub fn find_station(conn: &Connection, code: &str) -> Result<Option<Station>, QueryError> {
    let station = conn
        .query_row(
            "SELECT id, station, name, latitude, longitude, elevation
             FROM station WHERE station = ?1
             ORDER BY id LIMIT 1",
            [code],
            |row| {
                Ok(Station {
                    id: row.get(0)?,
                    station: row.get(1)?,
                    name: row.get(2)?,
                    latitude: row.get(3)?,
                    longitude: row.get(4)?,
                    elevation: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(station)
}

// ---------------------------------------------------------------------------
// Temperature
// ---------------------------------------------------------------------------

/// The station reporting the most temperature observations.
///
/// Only non-null `tobs` values are counted. On a tie the lowest station code
/// wins.
pub fn most_active_station(conn: &Connection) -> Result<MostActiveStation, QueryError> {
    conn.query_row(
        "SELECT station, COUNT(tobs) AS observations
         FROM measurement
         WHERE station IS NOT NULL
         GROUP BY station
         ORDER BY observations DESC, station ASC
         LIMIT 1",
        [],
        |row| {
            Ok(MostActiveStation {
                station: row.get(0)?,
                observations: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(QueryError::NoData("no station has any measurements"))
}

/// Temperature series of the most active station over its own trailing
/// window.
#[derive(Debug, Clone, PartialEq)]
pub struct StationTemperatures {
    pub station: MostActiveStation,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub temperatures: Vec<Option<f64>>,
}

/// Raw `tobs` values of the most active station, from `window_days` before
/// that station's latest observation up to and including it.
pub fn most_active_station_temperatures(
    conn: &Connection,
    window_days: u32,
) -> Result<StationTemperatures, QueryError> {
    let station = most_active_station(conn)?;
    let last_date = station_latest_date(conn, &station.station)?;
    let first_date = window_start(last_date, window_days);

    let mut stmt = conn.prepare(
        "SELECT tobs FROM measurement
         WHERE station = ?1 AND date >= ?2 AND date <= ?3
         ORDER BY date, id",
    )?;
    let temperatures = stmt
        .query_map(
            params![
                station.station,
                format_iso_date(first_date),
                format_iso_date(last_date)
            ],
            |row| row.get(0),
        )?
        .collect::<Result<Vec<Option<f64>>, _>>()?;

    Ok(StationTemperatures {
        station,
        first_date,
        last_date,
        temperatures,
    })
}

/// MIN / AVG / MAX of `tobs` over `range`, both ends inclusive. Null
/// temperatures are ignored; a range with no temperatures gives all `None`.
pub fn temperature_stats(
    conn: &Connection,
    range: &DateRange,
) -> Result<TemperatureStats, QueryError> {
    let start = format_iso_date(range.start);
    let end = range.end.map(format_iso_date);

    let stats = conn.query_row(
        "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement
         WHERE date >= ?1 AND (?2 IS NULL OR date <= ?2)",
        params![start, end],
        |row| {
            Ok(TemperatureStats {
                min: row.get(0)?,
                avg: row.get(1)?,
                max: row.get(2)?,
            })
        },
    )?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
