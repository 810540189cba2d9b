//! Error types for testdb.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
