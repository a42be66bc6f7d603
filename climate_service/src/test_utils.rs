//! Shared fixtures for unit tests.

use crate::db::SCHEMA_SQL;
use crate::model::Station;
use rusqlite::{params, Connection};

pub fn station(code: &str, name: &str) -> Station {
    Station {
        id: 0,
        station: code.to_string(),
        name: Some(name.to_string()),
        latitude: Some(21.2716),
        longitude: Some(-157.8168),
        elevation: Some(3.0),
    }
}

/// One `measurement` row. Row ids are left to SQLite.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub station: String,
    pub date: String,
    pub prcp: Option<f64>,
    pub tobs: Option<f64>,
}

pub fn measurement(code: &str, date: &str, prcp: Option<f64>, tobs: Option<f64>) -> Measurement {
    Measurement {
        station: code.to_string(),
        date: date.to_string(),
        prcp,
        tobs,
    }
}

/// Builds an in-memory dataset with the declared schema. Row ids are
/// assigned by SQLite in insertion order.
pub fn memory_dataset(stations: &[Station], measurements: &[Measurement]) -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory SQLite should open");
    conn.execute_batch(SCHEMA_SQL).expect("schema should apply");
    for s in stations {
        conn.execute(
            "INSERT INTO station (station, name, latitude, longitude, elevation)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![s.station, s.name, s.latitude, s.longitude, s.elevation],
        )
        .expect("station fixture should insert");
    }
    for m in measurements {
        conn.execute(
            "INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)",
            params![m.station, m.date, m.prcp, m.tobs],
        )
        .expect("measurement fixture should insert");
    }
    conn
}
