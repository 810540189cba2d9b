//! Test database provisioning.
//!
//! [`Database`] carries the engine-independent lifecycle; [`MySql`] and
//! [`PostgreSql`] implement the [`Engine`] primitives on top of the vendor
//! client tools.

mod lifecycle;
mod marker;
mod mysql;
mod naming;
mod postgresql;
mod protocol;
mod template;
mod traits;

pub use lifecycle::{Database, DatabaseOptions};
pub use marker::{schema_mtime, MARKER_TABLE};
pub use mysql::MySql;
pub use naming::{build_dsn, generate_name, generate_name_with, MAX_SUFFIX};
pub use postgresql::{parse_database_list, PostgreSql};
pub use protocol::Protocol;
pub use template::{TemplateConfig, TemplateOutcome};
pub use traits::Engine;
