//! testdb library
//!
//! Provisions and tears down throwaway MySQL and PostgreSQL databases for
//! test suites by driving the engines' own client tools
//! (`mysqladmin`, `mysql`, `createdb`, `dropdb`, `psql`).
//!
//! ```ignore
//! use testdb::database::{Database, DatabaseOptions, PostgreSql};
//!
//! let db = Database::new(
//!     PostgreSql::from_env(),
//!     DatabaseOptions::default().with_schema("tests/schema.sql"),
//! )?;
//! db.create()?;
//! run_suite(db.dsn());
//! db.drop()?;
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod validation;
