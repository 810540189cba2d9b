//! Server connection parameters taken from the environment.

use crate::database::Protocol;

const DEFAULT_HOST: &str = "localhost";

/// Where a database server lives and how to log in to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            password: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Read `<PROTOCOL>_HOST`, `<PROTOCOL>_USER` and `<PROTOCOL>_PASS`
    /// from the process environment.
    pub fn from_env(protocol: Protocol) -> Self {
        Self::from_lookup(protocol, |key| std::env::var(key).ok())
    }

    /// Same as [`ConnectionConfig::from_env`] with a custom variable source.
    /// Empty values count as unset.
    pub fn from_lookup<F>(protocol: Protocol, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = protocol.env_prefix();
        let read = |suffix: &str| lookup(&format!("{}_{}", prefix, suffix)).filter(|v| !v.is_empty());

        Self {
            host: read("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            user: read("USER"),
            password: read("PASS"),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}
