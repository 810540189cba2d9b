//! Error types for test database provisioning.

use thiserror::Error;

/// Main error type for provisioning operations.
#[derive(Error, Debug)]
pub enum TestDbError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors.
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// Subprocess execution errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// The database itself could not be created. Provisioning cannot continue.
    #[error("{message}")]
    Setup { message: String },

    /// The schema file could not be loaded into a freshly created database.
    #[error("Could not initialize schema in database '{db_name}'")]
    Schema { db_name: String },

    /// The marker table could not be created, read or written.
    #[error("Could not access marker table in database '{db_name}': {message}")]
    Marker { db_name: String, message: String },

    /// The database could not be dropped, even after retrying.
    #[error("Could not drop database '{db_name}'")]
    Drop { db_name: String },

    /// The engine does not support the requested operation.
    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TestDbError {
    /// Whether the error leaves the test run without a usable database
    /// (or with one that could not be cleaned up).
    pub fn is_fatal(&self) -> bool {
        matches!(self, TestDbError::Setup { .. } | TestDbError::Drop { .. })
    }
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("Invalid database name '{name}': {message}")]
    InvalidDatabaseName { name: String, message: String },

    #[error("Invalid name prefix '{prefix}': {message}")]
    InvalidPrefix { prefix: String, message: String },

    #[error("Unknown protocol '{protocol}', must be one of: {expected}")]
    UnknownProtocol { protocol: String, expected: String },

    #[error("Missing required parameter: {param}")]
    MissingParameter { param: String },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("{program} exited with status {}: {stderr}", .exit_code.map_or("unknown".to_string(), |c| c.to_string()))]
    NonZeroExit {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

/// Result type alias for provisioning operations.
pub type TestDbResult<T> = Result<T, TestDbError>;
