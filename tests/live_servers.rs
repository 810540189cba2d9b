//! Tests against real database servers.
//!
//! Ignored by default. Point `MYSQL_*` / `POSTGRESQL_*` at a disposable
//! server and run `cargo test -- --ignored`.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use testdb::database::{Database, DatabaseOptions, MySql, PostgreSql, TemplateConfig};

fn schema() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "CREATE TABLE people (id INTEGER PRIMARY KEY, name VARCHAR(50));").unwrap();
    file
}

#[test]
#[ignore]
fn test_live_mysql_round_trip() {
    let schema = schema();
    let db = Database::new(MySql::from_env(), DatabaseOptions::default().with_schema(schema.path()))
        .unwrap();

    db.create().unwrap();
    assert!(db.exists().unwrap());
    db.drop().unwrap();
    assert!(!db.exists().unwrap());
}

#[test]
#[ignore]
fn test_live_postgresql_template_round_trip() {
    let schema = schema();
    let options = || {
        DatabaseOptions::default()
            .with_schema(schema.path())
            .with_drop_retry_delay(Duration::from_secs(1))
    };
    let engine = || PostgreSql::from_env().with_template(TemplateConfig::new("testdb_live_tmpl"));

    let db = Database::new(engine(), options()).unwrap();
    db.create().unwrap();
    assert!(db.exists().unwrap());
    db.drop().unwrap();
    assert!(!db.exists().unwrap());

    // Template stays around for the next run
    let again = Database::new(engine(), options()).unwrap();
    again.create().unwrap();
    again.drop().unwrap();
}
