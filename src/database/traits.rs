//! Engine trait definition.

use std::path::Path;

use crate::config::ConnectionConfig;
use crate::error::{TestDbError, TestDbResult};

use super::protocol::Protocol;
use super::template::TemplateConfig;

/// Engine-specific primitives, each backed by a vendor client tool.
///
/// The engine-independent recipe (naming, schema loading, marking, drop
/// retry, template caching) lives in [`Database`](super::Database), which
/// drives these primitives. A primitive fails when its tool exits non-zero.
pub trait Engine: Send + Sync {
    /// DSN scheme and environment variable prefix.
    fn protocol(&self) -> Protocol;

    /// Server the engine's tools talk to.
    fn connection(&self) -> &ConnectionConfig;

    /// Create an empty database.
    fn create_db(&self, db_name: &str) -> TestDbResult<()>;

    /// Load a SQL script into an existing database.
    fn create_schema(&self, db_name: &str, schema_path: &Path) -> TestDbResult<()>;

    /// Drop a database.
    fn drop_db(&self, db_name: &str) -> TestDbResult<()>;

    /// Run one SQL statement in a database and return its tab/pipe
    /// separated output without headers.
    fn execute_sql(&self, db_name: &str, sql: &str) -> TestDbResult<String>;

    /// Names of all databases on the server.
    fn list_db_names(&self) -> TestDbResult<Vec<String>>;

    /// Template database to cache the schema in, if the engine uses one.
    fn template(&self) -> Option<&TemplateConfig> {
        None
    }

    /// Create a database as a copy of `template`.
    fn create_db_from_template(&self, db_name: &str, template: &str) -> TestDbResult<()> {
        Err(TestDbError::Unsupported {
            message: format!(
                "{} cannot create '{}' from template '{}'",
                self.protocol(),
                db_name,
                template
            ),
        })
    }
}
