//! Read-only access to the climate dataset.
//!
//! The dataset is a single SQLite file holding the `station` and
//! `measurement` tables. Its layout is declared here rather than discovered
//! from the file, and `connect_and_verify` checks the file against that
//! declaration before the service starts answering requests.
//!
//! Every request gets its own connection through [`Dataset::with_session`].
//! The connection is dropped (and so closed) when the closure returns,
//! whichever way it returns.

use crate::model::QueryError;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Declared schema
// ---------------------------------------------------------------------------

/// DDL matching the layout of the published dataset file.
///
/// The service never executes this against the live dataset; it exists so
/// fixtures and tooling build files with the same layout the verifier expects.
pub const SCHEMA_SQL: &str = "
    CREATE TABLE station (
        id INTEGER PRIMARY KEY,
        station TEXT,
        name TEXT,
        latitude FLOAT,
        longitude FLOAT,
        elevation FLOAT
    );
    CREATE TABLE measurement (
        id INTEGER PRIMARY KEY,
        station TEXT,
        date TEXT,
        prcp FLOAT,
        tobs FLOAT
    );
";

pub const STATION_COLUMNS: &[&str] = &["id", "station", "name", "latitude", "longitude", "elevation"];

pub const MEASUREMENT_COLUMNS: &[&str] = &["id", "station", "date", "prcp", "tobs"];

// ---------------------------------------------------------------------------
// Data-access context
// ---------------------------------------------------------------------------

/// Handle on the dataset file, created once at startup and cloned into each
/// request handler.
///
/// Holds no open connection itself.
#[derive(Debug, Clone)]
pub struct Dataset {
    path: Arc<PathBuf>,
}

impl Dataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh read-only connection.
    pub fn session(&self) -> Result<Connection, QueryError> {
        Connection::open_with_flags(
            self.path.as_path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| QueryError::StorageUnavailable {
            path: self.path.to_path_buf(),
            source,
        })
    }

    /// Runs `query` on a connection scoped to this call.
    pub fn with_session<T>(
        &self,
        query: impl FnOnce(&Connection) -> Result<T, QueryError>,
    ) -> Result<T, QueryError> {
        let conn = self.session()?;
        query(&conn)
    }
}

// ---------------------------------------------------------------------------
// Startup verification
// ---------------------------------------------------------------------------

/// Opens the dataset at `path` and checks that both tables carry every
/// declared column. Returns the context handlers should share.
pub fn connect_and_verify(path: &Path) -> Result<Dataset, QueryError> {
    let dataset = Dataset::new(path);
    dataset.with_session(verify_schema)?;
    Ok(dataset)
}

/// Fails with `SchemaMismatch` naming the first missing table or columns.
pub fn verify_schema(conn: &Connection) -> Result<(), QueryError> {
    for (table, expected) in [("station", STATION_COLUMNS), ("measurement", MEASUREMENT_COLUMNS)] {
        let present = table_columns(conn, table)?;
        if present.is_empty() {
            return Err(QueryError::SchemaMismatch(format!(
                "table '{}' not found",
                table
            )));
        }

        let missing: Vec<&str> = expected
            .iter()
            .copied()
            .filter(|column| !present.iter().any(|p| p.eq_ignore_ascii_case(column)))
            .collect();
        if !missing.is_empty() {
            return Err(QueryError::SchemaMismatch(format!(
                "table '{}' is missing column(s): {}",
                table,
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, QueryError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
