//! PostgreSQL engine.
//!
//! Drives `createdb`, `dropdb` and `psql`. The password travels in the
//! `PGPASSWORD` environment variable.

use std::path::Path;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::error::TestDbResult;
use crate::executor::{Invocation, ProcessRunner, SubprocessResult, SystemRunner};

use super::protocol::Protocol;
use super::template::TemplateConfig;
use super::traits::Engine;

/// PostgreSQL servers, with optional template caching.
pub struct PostgreSql {
    connection: ConnectionConfig,
    runner: Arc<dyn ProcessRunner>,
    encoding: Option<String>,
    template: Option<TemplateConfig>,
}

impl PostgreSql {
    pub fn new(connection: ConnectionConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            connection,
            runner,
            encoding: None,
            template: None,
        }
    }

    /// Connection from `POSTGRESQL_HOST`/`POSTGRESQL_USER`/`POSTGRESQL_PASS`,
    /// real processes.
    pub fn from_env() -> Self {
        Self::new(
            ConnectionConfig::from_env(Protocol::Postgresql),
            Arc::new(SystemRunner::default()),
        )
    }

    /// Encoding passed to `createdb -E`.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Cache the schema in a template database and copy it for each run.
    pub fn with_template(mut self, template: TemplateConfig) -> Self {
        self.template = Some(template);
        self
    }

    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// `command -h host [-U user]`, plus `PGPASSWORD` when set.
    fn login(&self, command: &str) -> Invocation {
        let mut invocation = Invocation::new(command).args(["-h", self.connection.host.as_str()]);
        if let Some(user) = &self.connection.user {
            invocation = invocation.args(["-U", user.as_str()]);
        }
        if let Some(password) = &self.connection.password {
            invocation = invocation.env("PGPASSWORD", password).sensitive();
        }
        invocation
    }

    fn createdb(&self, db_name: &str, template: Option<&str>) -> TestDbResult<()> {
        let mut invocation = self.login("createdb");
        if let Some(template) = template {
            invocation = invocation.args(["-T", template]);
        }
        if let Some(encoding) = &self.encoding {
            invocation = invocation.args(["-E", encoding.as_str()]);
        }
        self.run(invocation.arg(db_name))?;
        Ok(())
    }

    fn run(&self, invocation: Invocation) -> TestDbResult<SubprocessResult> {
        self.runner.run(&invocation)?.check(&invocation.program)
    }
}

impl Engine for PostgreSql {
    fn protocol(&self) -> Protocol {
        Protocol::Postgresql
    }

    fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    fn create_db(&self, db_name: &str) -> TestDbResult<()> {
        self.createdb(db_name, None)
    }

    fn create_schema(&self, db_name: &str, schema_path: &Path) -> TestDbResult<()> {
        self.run(
            self.login("psql")
                .arg("-f")
                .arg(schema_path.to_string_lossy())
                .args(["-v", "ON_ERROR_STOP=true", "--quiet", db_name]),
        )?;
        Ok(())
    }

    fn drop_db(&self, db_name: &str) -> TestDbResult<()> {
        self.run(self.login("dropdb").arg(db_name))?;
        Ok(())
    }

    fn execute_sql(&self, db_name: &str, sql: &str) -> TestDbResult<String> {
        let result = self.run(self.login("psql").args([
            "-X",
            "-A",
            "-t",
            "-v",
            "ON_ERROR_STOP=true",
            "--quiet",
            "-c",
            sql,
            db_name,
        ]))?;
        Ok(result.stdout)
    }

    fn list_db_names(&self) -> TestDbResult<Vec<String>> {
        let result = self.run(self.login("psql").args(["-l", "-A"]))?;
        Ok(parse_database_list(&result.stdout))
    }

    fn template(&self) -> Option<&TemplateConfig> {
        self.template.as_ref()
    }

    fn create_db_from_template(&self, db_name: &str, template: &str) -> TestDbResult<()> {
        self.createdb(db_name, Some(template))
    }
}

/// Extract database names from unaligned `psql -l -A` output.
///
/// The first two lines are the title and the column header, the last one
/// the row count. Access privileges spanning several entries put the extra
/// entries on lines of their own without a `|`.
pub fn parse_database_list(raw: &str) -> Vec<String> {
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < 3 {
        return Vec::new();
    }

    lines[2..lines.len() - 1]
        .iter()
        .filter(|line| line.contains('|'))
        .filter_map(|line| line.split('|').next())
        .map(str::to_string)
        .collect()
}
