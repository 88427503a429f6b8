//! Process-wide settings.
//!
//! # Responsibilities
//! - Hold every top-level key of `config.yml`, known or not
//! - Expose typed accessors for the sections startup depends on
//!
//! # Design Decisions
//! - Built once through [`SettingsBuilder`], immutable afterwards
//! - Shared as `Arc<Settings>`; there is no global instance
//! - Missing keys surface as [`ConfigError`] when read, never as a panic

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::config::loader::ConfigError;
use crate::config::schema::{describe, scalar_to_string, DbSettings, LogSettings};

/// Immutable settings snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Look up a top-level setting.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up a top-level setting that must be present.
    pub fn require(&self, key: &str) -> Result<&Value, ConfigError> {
        match self.values.get(key) {
            Some(Value::Null) | None => Err(ConfigError::missing(key)),
            Some(value) => Ok(value),
        }
    }

    /// A scalar setting rendered as text.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string)
    }

    /// A setting that must be a nested mapping.
    pub fn section(&self, key: &str) -> Result<&Mapping, ConfigError> {
        match self.require(key)? {
            Value::Mapping(mapping) => Ok(mapping),
            other => Err(ConfigError::invalid(
                key,
                format!("expected a mapping, found {}", describe(other)),
            )),
        }
    }

    /// Database connection settings (`db`).
    pub fn db(&self) -> Result<DbSettings, ConfigError> {
        DbSettings::from_mapping(self.section(DbSettings::SECTION)?)
    }

    /// Logger settings (`logmaster`).
    pub fn logmaster(&self) -> Result<LogSettings, ConfigError> {
        LogSettings::from_mapping(self.section(LogSettings::SECTION)?)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The only way to mutate settings: before they are frozen.
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    values: BTreeMap<String, Value>,
}

impl SettingsBuilder {
    /// Store every key of a parsed configuration mapping.
    ///
    /// Unknown keys are accepted as-is. Later entries replace earlier ones.
    pub fn populate(mut self, mapping: Mapping) -> Result<Self, ConfigError> {
        for (key, value) in mapping {
            let key = scalar_to_string(&key).ok_or_else(|| ConfigError::InvalidKey {
                found: describe(&key).to_string(),
            })?;
            self.values.insert(key, value);
        }
        Ok(self)
    }

    /// Set a single value, replacing any previous one.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Settings {
        Settings {
            values: self.values,
        }
    }
}
