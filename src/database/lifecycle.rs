//! Create/drop lifecycle shared by all engines.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{TestDbError, TestDbResult};
use crate::validation::{validate_database_name, validate_prefix};

use super::naming::{build_dsn, generate_name};
use super::traits::Engine;

/// How to name and build a test database.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// SQL script loaded into the new database.
    pub schema_path: Option<PathBuf>,
    /// Prefix for generated names.
    pub prefix: String,
    /// Use this name instead of generating one.
    pub db_name: Option<String>,
    /// Pause before the single drop retry.
    pub drop_retry_delay: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            schema_path: None,
            prefix: "testdb".to_string(),
            db_name: None,
            drop_retry_delay: Duration::from_secs(1),
        }
    }
}

impl DatabaseOptions {
    pub fn with_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Use a fixed name instead of a generated one.
    ///
    /// The name must be 1-63 characters of `[A-Za-z0-9_-]` and not a system
    /// database, even where the server would accept a quoted name such as
    /// `my.db`. The same rule guards [`Database::drop`]. [`Database::new`]
    /// rejects anything else with a validation error.
    pub fn with_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn with_drop_retry_delay(mut self, delay: Duration) -> Self {
        self.drop_retry_delay = delay;
        self
    }
}

/// A test database on a server, driven through an [`Engine`].
///
/// The name and DSN are fixed at construction. Nothing touches the server
/// until [`create`](Database::create) is called.
pub struct Database<E: Engine> {
    engine: E,
    name: String,
    schema_path: Option<PathBuf>,
    dsn: String,
    drop_retry_delay: Duration,
}

impl<E: Engine> Database<E> {
    pub fn new(engine: E, options: DatabaseOptions) -> TestDbResult<Self> {
        let name = match options.db_name {
            Some(name) => validate_database_name(&name)?.to_string(),
            None => {
                let name = generate_name(validate_prefix(&options.prefix)?);
                validate_database_name(&name)?;
                name
            }
        };

        if let Some(template) = engine.template() {
            validate_database_name(&template.name)?;
            if options.schema_path.is_none() {
                return Err(TestDbError::Config {
                    message: format!(
                        "Template database '{}' requires a schema file",
                        template.name
                    ),
                });
            }
        }

        let dsn = build_dsn(engine.protocol(), engine.connection(), &name);
        debug!(protocol = %engine.protocol(), name = %name, "Test database named");

        Ok(Self {
            engine,
            name,
            schema_path: options.schema_path,
            dsn,
            drop_retry_delay: options.drop_retry_delay,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connection string for this database.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn schema_path(&self) -> Option<&Path> {
        self.schema_path.as_deref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Connection string for any database on the same server.
    pub fn get_dsn(&self, db_name: &str) -> String {
        build_dsn(self.engine.protocol(), self.engine.connection(), db_name)
    }

    /// Set the database up on the server.
    ///
    /// With a template configured, the schema is cached in the template and
    /// the database is created as a copy of it.
    pub fn create(&self) -> TestDbResult<()> {
        match self.engine.template() {
            Some(template) => {
                self.create_template()?;
                self.engine
                    .create_db_from_template(&self.name, &template.name)
                    .map_err(|e| TestDbError::Setup {
                        message: format!(
                            "Could not create database '{}' from template '{}': {}",
                            self.name, template.name, e
                        ),
                    })?;
            }
            None => self.create_db_from_schema(&self.name)?,
        }

        info!(protocol = %self.engine.protocol(), name = %self.name, "Test database created");
        Ok(())
    }

    /// Create `db_name`, load the schema file if there is one, and add the
    /// marker table.
    pub fn create_db_from_schema(&self, db_name: &str) -> TestDbResult<()> {
        self.engine
            .create_db(db_name)
            .map_err(|e| TestDbError::Setup {
                message: format!("Could not create database '{}': {}", db_name, e),
            })?;

        if let Some(schema_path) = &self.schema_path {
            debug!(name = %db_name, schema = %schema_path.display(), "Loading schema");
            self.engine
                .create_schema(db_name, schema_path)
                .map_err(|e| {
                    warn!(name = %db_name, error = %e, "Schema load failed");
                    TestDbError::Schema {
                        db_name: db_name.to_string(),
                    }
                })?;
        }

        self.mark_testing(db_name)
    }

    /// Remove the database from the server.
    pub fn drop(&self) -> TestDbResult<()> {
        self.drop_with_retry(&self.name)?;
        info!(protocol = %self.engine.protocol(), name = %self.name, "Test database dropped");
        Ok(())
    }

    /// Drop `db_name`, retrying once after the configured delay.
    pub(crate) fn drop_with_retry(&self, db_name: &str) -> TestDbResult<()> {
        let Err(first) = self.engine.drop_db(db_name) else {
            return Ok(());
        };

        warn!(
            name = %db_name,
            error = %first,
            retry_in_ms = self.drop_retry_delay.as_millis(),
            "Drop failed, retrying"
        );
        // Give the server time to close lingering connections
        std::thread::sleep(self.drop_retry_delay);

        self.engine.drop_db(db_name).map_err(|e| {
            warn!(name = %db_name, error = %e, "Drop retry failed");
            TestDbError::Drop {
                db_name: db_name.to_string(),
            }
        })
    }

    /// Whether the database currently exists on the server.
    pub fn exists(&self) -> TestDbResult<bool> {
        Ok(self.engine.list_db_names()?.iter().any(|n| n == &self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::database::{MySql, PostgreSql, TemplateConfig};
    use crate::executor::{ScriptedRunner, SubprocessResult};
    use std::sync::Arc;

    fn mysql(runner: &Arc<ScriptedRunner>) -> MySql {
        MySql::new(ConnectionConfig::default(), runner.clone())
    }

    fn fast_options() -> DatabaseOptions {
        DatabaseOptions::default().with_drop_retry_delay(Duration::ZERO)
    }

    #[test]
    fn test_generated_name_and_dsn() {
        let runner = Arc::new(ScriptedRunner::new());
        let db = Database::new(mysql(&runner), fast_options().with_prefix("suite")).unwrap();

        let suffix: u32 = db.name().strip_prefix("suite-").unwrap().parse().unwrap();
        assert!(suffix <= 9999);
        assert_eq!(db.dsn(), format!("mysql://localhost/{}", db.name()));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_explicit_name_is_validated() {
        let runner = Arc::new(ScriptedRunner::new());
        let db = Database::new(mysql(&runner), fast_options().with_name("fixed_db")).unwrap();
        assert_eq!(db.name(), "fixed_db");

        assert!(Database::new(mysql(&runner), fast_options().with_name("mysql")).is_err());
        assert!(Database::new(mysql(&runner), fast_options().with_prefix("bad prefix")).is_err());
    }

    #[test]
    fn test_explicit_name_rejects_quoted_identifiers() {
        let runner = Arc::new(ScriptedRunner::new());
        for name in ["my.db", "with space", "-leading", "Template1"] {
            let result = Database::new(mysql(&runner), fast_options().with_name(name));
            assert!(
                matches!(result, Err(TestDbError::Validation { .. })),
                "{name} accepted"
            );
        }
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_get_dsn_for_other_database() {
        let runner = Arc::new(ScriptedRunner::new());
        let engine = MySql::new(
            ConnectionConfig::new("db").with_user("u").with_password("p"),
            runner,
        );
        let db = Database::new(engine, fast_options()).unwrap();
        assert_eq!(db.get_dsn("other"), "mysql://u:p@db/other");
    }

    #[test]
    fn test_create_without_schema_marks_database() {
        let runner = Arc::new(ScriptedRunner::new());
        let db = Database::new(mysql(&runner), fast_options().with_name("plain")).unwrap();
        db.create().unwrap();

        let programs: Vec<String> = runner.calls().into_iter().map(|c| c.program).collect();
        assert_eq!(programs, vec!["mysqladmin", "mysql"]);
        let marker = &runner.calls_to("mysql")[0];
        assert!(marker
            .args
            .iter()
            .any(|a| a.contains("CREATE TABLE tmp_functest")));
    }

    #[test]
    fn test_create_failure_is_fatal() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("mysqladmin", SubprocessResult::failed(1, "access denied"));
        let db = Database::new(mysql(&runner), fast_options().with_name("denied")).unwrap();

        let err = db.create().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().starts_with("Could not create database 'denied'"));
    }

    #[test]
    fn test_schema_failure_is_runtime_error() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("mysql", SubprocessResult::failed(1, "syntax error"));
        let db = Database::new(
            mysql(&runner),
            fast_options().with_name("broken").with_schema("/tmp/schema.sql"),
        )
        .unwrap();

        let err = db.create().unwrap_err();
        assert!(matches!(err, TestDbError::Schema { ref db_name } if db_name == "broken"));
        assert!(!err.is_fatal());
        // No marker table after a failed schema load
        assert_eq!(runner.calls_to("mysql").len(), 1);
    }

    #[test]
    fn test_drop_retry_succeeds_on_second_attempt() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("mysqladmin", SubprocessResult::failed(1, "busy"));
        let db = Database::new(mysql(&runner), fast_options().with_name("retry_ok")).unwrap();

        db.drop().unwrap();
        assert_eq!(runner.calls_to("mysqladmin").len(), 2);
    }

    #[test]
    fn test_drop_fails_after_two_attempts() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .respond("mysqladmin", SubprocessResult::failed(1, "busy"))
            .respond("mysqladmin", SubprocessResult::failed(1, "still busy"));
        let db = Database::new(mysql(&runner), fast_options().with_name("stuck")).unwrap();

        let err = db.drop().unwrap_err();
        assert!(matches!(err, TestDbError::Drop { ref db_name } if db_name == "stuck"));
        assert!(err.is_fatal());
        assert_eq!(runner.calls_to("mysqladmin").len(), 2);
    }

    #[test]
    fn test_drop_first_attempt_success_does_not_retry() {
        let runner = Arc::new(ScriptedRunner::new());
        let db = Database::new(mysql(&runner), fast_options().with_name("clean")).unwrap();
        db.drop().unwrap();
        assert_eq!(runner.calls_to("mysqladmin").len(), 1);
    }

    #[test]
    fn test_template_requires_schema() {
        let runner = Arc::new(ScriptedRunner::new());
        let engine = PostgreSql::new(ConnectionConfig::default(), runner)
            .with_template(TemplateConfig::new("tmpl"));
        let result = Database::new(engine, fast_options());
        assert!(matches!(result, Err(TestDbError::Config { .. })));
    }

    #[test]
    fn test_exists() {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .respond("mysql", SubprocessResult::succeeded("information_schema\nhere\n"))
            .respond("mysql", SubprocessResult::succeeded("information_schema\n"));
        let db = Database::new(mysql(&runner), fast_options().with_name("here")).unwrap();
        assert!(db.exists().unwrap());
        assert!(!db.exists().unwrap());
    }
}
