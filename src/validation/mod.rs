//! Input validation module.
//!
//! Provides validators for database names and name prefixes.

mod database;

pub use database::{validate_database_name, validate_prefix, MAX_DATABASE_NAME_LENGTH};
