//! Supported database engines.

use std::fmt;
use std::str::FromStr;

use crate::error::{TestDbError, ValidationErrorKind};

/// A database engine, named the way it appears as a DSN scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Mysql,
    Postgresql,
}

impl Protocol {
    pub const ALL: [Protocol; 2] = [Protocol::Mysql, Protocol::Postgresql];

    /// DSN scheme.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Mysql => "mysql",
            Protocol::Postgresql => "postgresql",
        }
    }

    /// Prefix of the `<PREFIX>_HOST`, `<PREFIX>_USER` and `<PREFIX>_PASS`
    /// environment variables.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Protocol::Mysql => "MYSQL",
            Protocol::Postgresql => "POSTGRESQL",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = TestDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| TestDbError::Validation {
                kind: ValidationErrorKind::UnknownProtocol {
                    protocol: s.to_string(),
                    expected: Protocol::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_protocols() {
        assert_eq!("mysql".parse::<Protocol>().unwrap(), Protocol::Mysql);
        assert_eq!("PostgreSQL".parse::<Protocol>().unwrap(), Protocol::Postgresql);
    }

    #[test]
    fn test_unknown_protocol() {
        let err = "sqlite".parse::<Protocol>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Unknown protocol 'sqlite', must be one of: mysql, postgresql"
        );
        assert!("".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_env_prefix_is_uppercased_scheme() {
        for protocol in Protocol::ALL {
            assert_eq!(protocol.env_prefix(), protocol.as_str().to_uppercase());
        }
    }
}
