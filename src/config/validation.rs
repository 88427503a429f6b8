//! Configuration validation.
//!
//! # Responsibilities
//! - Check that every section startup depends on is present and well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs right after settings are populated, before any side effect

use crate::config::loader::ConfigError;
use crate::config::schema::{DbSettings, LogSettings};
use crate::config::settings::Settings;

/// Validate the required sections and return their typed forms.
pub fn validate_settings(settings: &Settings) -> Result<(DbSettings, LogSettings), ConfigError> {
    let db = settings.db();
    let log = settings.logmaster();

    match (db, log) {
        (Ok(db), Ok(log)) => Ok((db, log)),
        (db, log) => {
            let errors = [db.err(), log.err()].into_iter().flatten().collect();
            Err(ConfigError::Validation(errors))
        }
    }
}
