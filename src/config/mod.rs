//! Configuration module for testdb.
//!
//! Handles loading settings from TOML files and reading server connection
//! parameters from the environment.

mod connection;
mod settings;

pub use connection::ConnectionConfig;
pub use settings::*;
