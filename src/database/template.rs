//! Template database caching.
//!
//! Loading a large schema is slow. Engines that can copy databases keep a
//! template with the schema already loaded and stamped with the schema
//! file's modification time, and only rebuild it when the file changes.

use tracing::{info, warn};

use crate::error::{TestDbError, TestDbResult};

use super::lifecycle::Database;
use super::marker::schema_mtime;
use super::traits::Engine;

/// Template database settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Name of the template database.
    pub name: String,
    /// Rebuild even when the stored timestamp is current.
    pub force: bool,
}

impl TemplateConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            force: false,
        }
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// What [`Database::create_template`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOutcome {
    /// The existing template was current and left alone.
    Reused,
    /// No template existed; one was built.
    Built,
    /// A stale or forced template was dropped and rebuilt.
    Rebuilt,
}

impl<E: Engine> Database<E> {
    /// Make sure the engine's template database is current.
    pub fn create_template(&self) -> TestDbResult<TemplateOutcome> {
        let template = self.engine().template().ok_or_else(|| TestDbError::Unsupported {
            message: format!("no template configured for {}", self.engine().protocol()),
        })?;
        let schema_path = self.schema_path().ok_or_else(|| TestDbError::Config {
            message: format!("Template database '{}' requires a schema file", template.name),
        })?;
        let current_mtime = schema_mtime(schema_path)?;

        let mut outcome = TemplateOutcome::Built;
        if self.engine().list_db_names()?.contains(&template.name) {
            let stored_mtime = match self.read_schema_mtime(&template.name) {
                Ok(mtime) => Some(mtime),
                Err(e) => {
                    warn!(template = %template.name, error = %e, "Template marker unreadable");
                    None
                }
            };

            if !template.force && stored_mtime == Some(current_mtime) {
                info!(template = %template.name, schema_mtime = current_mtime, "Reusing template database");
                return Ok(TemplateOutcome::Reused);
            }

            info!(
                template = %template.name,
                stored_mtime = ?stored_mtime,
                schema_mtime = current_mtime,
                forced = template.force,
                "Dropping outdated template database"
            );
            self.drop_with_retry(&template.name)?;
            outcome = TemplateOutcome::Rebuilt;
        }

        self.create_db_from_schema(&template.name)?;
        self.write_schema_mtime(&template.name, current_mtime)?;
        info!(template = %template.name, schema_mtime = current_mtime, "Template database built");

        Ok(outcome)
    }
}
