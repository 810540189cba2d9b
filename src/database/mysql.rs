//! MySQL engine.
//!
//! Drives `mysqladmin` and `mysql`. Both accept the password on the command
//! line only (`-p<password>`), so such invocations are marked sensitive.

use std::path::Path;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::error::TestDbResult;
use crate::executor::{output_lines, Invocation, ProcessRunner, SubprocessResult, SystemRunner};

use super::protocol::Protocol;
use super::traits::Engine;

/// MySQL (and MariaDB) servers.
pub struct MySql {
    connection: ConnectionConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl MySql {
    pub fn new(connection: ConnectionConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { connection, runner }
    }

    /// Connection from `MYSQL_HOST`/`MYSQL_USER`/`MYSQL_PASS`, real processes.
    pub fn from_env() -> Self {
        Self::new(
            ConnectionConfig::from_env(Protocol::Mysql),
            Arc::new(SystemRunner::default()),
        )
    }

    /// `command -h host [-u user] [-p<password>]`.
    fn login(&self, command: &str) -> Invocation {
        let mut invocation = Invocation::new(command).args(["-h", self.connection.host.as_str()]);
        if let Some(user) = &self.connection.user {
            invocation = invocation.args(["-u", user.as_str()]);
        }
        if let Some(password) = &self.connection.password {
            invocation = invocation.arg(format!("-p{}", password)).sensitive();
        }
        invocation
    }

    fn run(&self, invocation: Invocation) -> TestDbResult<SubprocessResult> {
        self.runner.run(&invocation)?.check(&invocation.program)
    }
}

impl Engine for MySql {
    fn protocol(&self) -> Protocol {
        Protocol::Mysql
    }

    fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    fn create_db(&self, db_name: &str) -> TestDbResult<()> {
        self.run(self.login("mysqladmin").args(["create", db_name]))?;
        Ok(())
    }

    fn create_schema(&self, db_name: &str, schema_path: &Path) -> TestDbResult<()> {
        self.run(self.login("mysql").arg(db_name).stdin_file(schema_path))?;
        Ok(())
    }

    fn drop_db(&self, db_name: &str) -> TestDbResult<()> {
        self.run(self.login("mysqladmin").args(["--force", "drop", db_name]))?;
        Ok(())
    }

    fn execute_sql(&self, db_name: &str, sql: &str) -> TestDbResult<String> {
        let result = self.run(
            self.login("mysql")
                .args(["--batch", "--skip-column-names", "-e", sql, db_name]),
        )?;
        Ok(result.stdout)
    }

    fn list_db_names(&self) -> TestDbResult<Vec<String>> {
        let result = self.run(
            self.login("mysql")
                .args(["--batch", "--skip-column-names", "-e", "SHOW DATABASES"]),
        )?;
        Ok(output_lines(&result.stdout).map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TestDbError;
    use crate::executor::ScriptedRunner;

    fn engine(connection: ConnectionConfig) -> (MySql, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner::new());
        (MySql::new(connection, runner.clone()), runner)
    }

    #[test]
    fn test_login_without_credentials() {
        let (mysql, runner) = engine(ConnectionConfig::new("localhost"));
        mysql.create_db("testdb-1").unwrap();

        let call = &runner.calls()[0];
        assert_eq!(
            call.command_line(),
            vec!["mysqladmin", "-h", "localhost", "create", "testdb-1"]
        );
        assert!(!call.sensitive);
    }

    #[test]
    fn test_login_with_credentials_is_sensitive() {
        let (mysql, runner) = engine(
            ConnectionConfig::new("db")
                .with_user("root")
                .with_password("pw"),
        );
        mysql.drop_db("testdb-1").unwrap();

        let call = &runner.calls()[0];
        assert_eq!(
            call.command_line(),
            vec!["mysqladmin", "-h", "db", "-u", "root", "-ppw", "--force", "drop", "testdb-1"]
        );
        assert!(call.sensitive);
    }

    #[test]
    fn test_schema_is_fed_on_stdin() {
        let (mysql, runner) = engine(ConnectionConfig::default());
        mysql
            .create_schema("testdb-1", Path::new("/srv/schema.sql"))
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(call.command_line(), vec!["mysql", "-h", "localhost", "testdb-1"]);
        assert_eq!(call.stdin_file.as_deref(), Some(Path::new("/srv/schema.sql")));
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let (mysql, runner) = engine(ConnectionConfig::default());
        runner.respond("mysqladmin", SubprocessResult::failed(1, "database exists"));
        assert!(matches!(
            mysql.create_db("testdb-1"),
            Err(TestDbError::Command { .. })
        ));
    }

    #[test]
    fn test_list_db_names() {
        let (mysql, runner) = engine(ConnectionConfig::default());
        runner.respond(
            "mysql",
            SubprocessResult::succeeded("information_schema\nmysql\ntestdb-7\n"),
        );
        assert_eq!(
            mysql.list_db_names().unwrap(),
            vec!["information_schema", "mysql", "testdb-7"]
        );
    }

    #[test]
    fn test_no_template_support() {
        let (mysql, _runner) = engine(ConnectionConfig::default());
        assert!(mysql.template().is_none());
        assert!(matches!(
            mysql.create_db_from_template("a", "b"),
            Err(TestDbError::Unsupported { .. })
        ));
    }
}
