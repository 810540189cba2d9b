//! Database name validation.
//!
//! Names end up as bare arguments to the client tools and inside DSNs, and a
//! bad name passed to `dropdb` could hit a database the test run does not own.

use crate::error::{TestDbError, ValidationErrorKind};

/// Maximum length for database names (PostgreSQL truncates beyond 63 bytes).
pub const MAX_DATABASE_NAME_LENGTH: usize = 63;

/// Room left for the `-<suffix>` part of a generated name.
const SUFFIX_LENGTH: usize = 5;

/// Validates a database name.
///
/// # Rules
///
/// - Must be 1-63 characters
/// - Must start with a letter, digit or underscore
/// - Can contain only alphanumeric characters, underscores and hyphens
/// - Cannot be a system database of either engine
pub fn validate_database_name(name: &str) -> Result<&str, TestDbError> {
    let invalid = |message: String| TestDbError::Validation {
        kind: ValidationErrorKind::InvalidDatabaseName {
            name: name.to_string(),
            message,
        },
    };

    let Some(first_char) = name.chars().next() else {
        return Err(invalid("Database name cannot be empty".to_string()));
    };

    if name.len() > MAX_DATABASE_NAME_LENGTH {
        return Err(invalid(format!(
            "Database name exceeds maximum length of {} characters",
            MAX_DATABASE_NAME_LENGTH
        )));
    }

    if !first_char.is_ascii_alphanumeric() && first_char != '_' {
        return Err(invalid(
            "Database name must start with a letter, digit or underscore".to_string(),
        ));
    }

    if !name.chars().all(is_name_char) {
        return Err(invalid(
            "Database name can only contain letters, numbers, underscores and hyphens".to_string(),
        ));
    }

    if is_system_database(&name.to_lowercase()) {
        return Err(invalid(format!("'{}' is a system database", name)));
    }

    Ok(name)
}

/// Validates a prefix for generated database names.
///
/// Same character rules as database names, short enough that
/// `<prefix>-9999` still fits.
pub fn validate_prefix(prefix: &str) -> Result<&str, TestDbError> {
    let invalid = |message: &str| TestDbError::Validation {
        kind: ValidationErrorKind::InvalidPrefix {
            prefix: prefix.to_string(),
            message: message.to_string(),
        },
    };

    let Some(first_char) = prefix.chars().next() else {
        return Err(invalid("Prefix cannot be empty"));
    };
    if prefix.len() + SUFFIX_LENGTH > MAX_DATABASE_NAME_LENGTH {
        return Err(invalid("Prefix leaves no room for the random suffix"));
    }
    if !first_char.is_ascii_alphanumeric() && first_char != '_' {
        return Err(invalid("Prefix must start with a letter, digit or underscore"));
    }
    if !prefix.chars().all(is_name_char) {
        return Err(invalid(
            "Prefix can only contain letters, numbers, underscores and hyphens",
        ));
    }

    Ok(prefix)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Check if a name belongs to a database the server itself needs.
fn is_system_database(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        // MySQL
        "mysql",
        "information_schema",
        "performance_schema",
        "sys",
        // PostgreSQL
        "postgres",
        "template0",
        "template1",
    ];
    RESERVED.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_database_name() {
        assert!(validate_database_name("testdb-1234").is_ok());
        assert!(validate_database_name("app_test").is_ok());
        assert!(validate_database_name("_private_db").is_ok());
        assert!(validate_database_name("2024_run").is_ok());
    }

    #[test]
    fn test_invalid_database_name() {
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name("-leading-hyphen").is_err());
        assert!(validate_database_name("my.database").is_err());
        assert!(validate_database_name("my database").is_err());
        assert!(validate_database_name("db; DROP TABLE users;--").is_err());
    }

    #[test]
    fn test_system_database_names() {
        assert!(validate_database_name("mysql").is_err());
        assert!(validate_database_name("information_schema").is_err());
        assert!(validate_database_name("postgres").is_err());
        assert!(validate_database_name("Template1").is_err());
    }

    #[test]
    fn test_database_name_length() {
        let long_name = "a".repeat(64);
        assert!(validate_database_name(&long_name).is_err());
        let max_name = "a".repeat(63);
        assert!(validate_database_name(&max_name).is_ok());
    }

    #[test]
    fn test_prefix() {
        assert!(validate_prefix("testdb").is_ok());
        assert!(validate_prefix("my_app-ci").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("bad prefix").is_err());
        assert!(validate_prefix(&"p".repeat(58)).is_ok());
        assert!(validate_prefix(&"p".repeat(59)).is_err());
    }
}
