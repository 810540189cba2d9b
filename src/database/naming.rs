//! Database identifiers and connection strings.

use rand::Rng;

use crate::config::ConnectionConfig;

use super::protocol::Protocol;

/// Largest random suffix of a generated name.
pub const MAX_SUFFIX: u32 = 9999;

/// Generate `<prefix>-<n>` with `n` drawn uniformly from `0..=9999`.
pub fn generate_name(prefix: &str) -> String {
    generate_name_with(prefix, &mut rand::thread_rng())
}

/// [`generate_name`] with a caller-supplied random source.
pub fn generate_name_with<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    format!("{}-{}", prefix, rng.gen_range(0..=MAX_SUFFIX))
}

/// Build `protocol://[user[:pass]@]host/db_name`.
///
/// A password without a user is ignored.
pub fn build_dsn(protocol: Protocol, connection: &ConnectionConfig, db_name: &str) -> String {
    let mut login = String::new();
    if let Some(user) = &connection.user {
        login.push_str(user);
        if let Some(password) = &connection.password {
            login.push(':');
            login.push_str(password);
        }
        login.push('@');
    }
    format!("{}://{}{}/{}", protocol, login, connection.host, db_name)
}
