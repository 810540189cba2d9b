//! Marker table written into every provisioned database.
//!
//! The table doubles as the schema timestamp store for template databases.

use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::debug;

use crate::error::{TestDbError, TestDbResult};
use crate::executor::output_lines;

use super::lifecycle::Database;
use super::traits::Engine;

/// Name of the marker table.
pub const MARKER_TABLE: &str = "tmp_functest";

/// Modification time of a schema file in whole seconds since the epoch.
pub fn schema_mtime(path: &Path) -> TestDbResult<i64> {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| TestDbError::Config {
            message: format!("Cannot read schema file '{}': {}", path.display(), e),
        })?;

    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    };
    Ok(secs)
}

impl<E: Engine> Database<E> {
    /// Create the marker table in `db_name`.
    pub(crate) fn mark_testing(&self, db_name: &str) -> TestDbResult<()> {
        let sql = format!("CREATE TABLE {} (schema_mtime INTEGER)", MARKER_TABLE);
        self.marker_sql(db_name, &sql).map(|_| ())
    }

    /// Schema timestamp stored in `db_name`, or 0 when no row was written.
    pub(crate) fn read_schema_mtime(&self, db_name: &str) -> TestDbResult<i64> {
        let sql = format!("SELECT schema_mtime FROM {}", MARKER_TABLE);
        let output = self.marker_sql(db_name, &sql)?;

        let Some(first) = output_lines(&output).next() else {
            return Ok(0);
        };
        first.parse::<i64>().map_err(|e| TestDbError::Marker {
            db_name: db_name.to_string(),
            message: format!("unexpected schema_mtime '{}': {}", first, e),
        })
    }

    /// Record the schema timestamp in `db_name`.
    pub(crate) fn write_schema_mtime(&self, db_name: &str, mtime: i64) -> TestDbResult<()> {
        debug!(name = %db_name, schema_mtime = mtime, "Recording schema timestamp");
        let sql = format!("INSERT INTO {} (schema_mtime) VALUES ({})", MARKER_TABLE, mtime);
        self.marker_sql(db_name, &sql).map(|_| ())
    }

    fn marker_sql(&self, db_name: &str, sql: &str) -> TestDbResult<String> {
        self.engine()
            .execute_sql(db_name, sql)
            .map_err(|e| TestDbError::Marker {
                db_name: db_name.to_string(),
                message: e.to_string(),
            })
    }
}
