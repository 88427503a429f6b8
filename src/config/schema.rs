//! Typed views over the composite settings consumed during startup.
//!
//! Source mappings are loosely typed: keys may be written as `adapter`,
//! `ADAPTER` or symbol-style `:adapter`, and scalar values may arrive as
//! strings, numbers or booleans. The constructors here normalize all of that
//! and report failures against the dotted key that was being read.

use std::fmt;
use std::str::FromStr;

use serde_yaml::{Mapping, Value};

use crate::config::loader::ConfigError;

/// Database section of `config.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbSettings {
    pub adapter: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
}

impl DbSettings {
    pub const SECTION: &'static str = "db";

    /// Parse the `db` sub-mapping.
    pub fn from_mapping(mapping: &Mapping) -> Result<Self, ConfigError> {
        let fields = NormalizedMapping::new(Self::SECTION, mapping)?;

        let adapter = fields
            .string("adapter")?
            .ok_or_else(|| ConfigError::missing(fields.key("adapter")))?;

        let port = match fields.string("port")? {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| {
                ConfigError::invalid(fields.key("port"), format!("`{raw}` is not a valid port"))
            })?),
            None => None,
        };

        Ok(Self {
            adapter: adapter.to_ascii_lowercase(),
            user: fields.string("user")?,
            password: fields.string("password")?,
            host: fields.string("host")?,
            port,
            name: fields.string("name")?,
        })
    }
}

/// Severity threshold for the process logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    ///
    /// `tracing` has no level above `error`, so `FATAL` and `UNKNOWN`
    /// collapse onto it.
    pub fn as_filter_directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error | Self::Fatal | Self::Unknown => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "FATAL" => Ok(Self::Fatal),
            "UNKNOWN" => Ok(Self::Unknown),
            other => Err(format!("unknown level `{other}`")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Logger section of `config.yml` (`logmaster`).
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub log_level: LogLevel,

    /// Log file name, relative to the configuration directory.
    pub file: String,

    pub raise_exception: bool,

    pub name: Option<String>,

    /// Alert delivery settings, handed to the logging backend untouched.
    pub email_config: Option<Mapping>,
}

impl LogSettings {
    pub const SECTION: &'static str = "logmaster";

    /// Parse the `logmaster` sub-mapping.
    pub fn from_mapping(mapping: &Mapping) -> Result<Self, ConfigError> {
        let fields = NormalizedMapping::new(Self::SECTION, mapping)?;

        let raw_level = fields
            .string("log_level")?
            .ok_or_else(|| ConfigError::missing(fields.key("log_level")))?;
        let log_level = raw_level
            .parse::<LogLevel>()
            .map_err(|reason| ConfigError::invalid(fields.key("log_level"), reason))?;

        let file = fields
            .string("file")?
            .ok_or_else(|| ConfigError::missing(fields.key("file")))?;

        let raise_exception = match fields.get("raise_exception") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" | "" => false,
                _ => {
                    return Err(ConfigError::invalid(
                        fields.key("raise_exception"),
                        format!("`{s}` is not a boolean"),
                    ))
                }
            },
            Some(other) => {
                return Err(ConfigError::invalid(
                    fields.key("raise_exception"),
                    format!("expected a boolean, found {}", describe(other)),
                ))
            }
        };

        let email_config = match fields.get("email_config") {
            None | Some(Value::Null) => None,
            Some(Value::Mapping(m)) => Some(m.clone()),
            Some(other) => {
                return Err(ConfigError::invalid(
                    fields.key("email_config"),
                    format!("expected a mapping, found {}", describe(other)),
                ))
            }
        };

        Ok(Self {
            log_level,
            file,
            raise_exception,
            name: fields.string("name")?,
            email_config,
        })
    }
}

/// A sub-mapping whose keys have been folded to lowercase, symbol prefix removed.
struct NormalizedMapping<'a> {
    section: &'static str,
    entries: Vec<(String, &'a Value)>,
}

impl<'a> NormalizedMapping<'a> {
    fn new(section: &'static str, mapping: &'a Mapping) -> Result<Self, ConfigError> {
        let entries = mapping
            .iter()
            .map(|(k, v)| {
                normalize_key(k)
                    .map(|key| (key, v))
                    .ok_or_else(|| ConfigError::InvalidKey {
                        found: describe(k).to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { section, entries })
    }

    fn key(&self, field: &str) -> String {
        format!("{}.{}", self.section, field)
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, value)| *value)
    }

    /// Scalar field as text. Empty strings and nulls count as absent.
    fn string(&self, field: &str) -> Result<Option<String>, ConfigError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => match scalar_to_string(value) {
                Some(s) if s.is_empty() => Ok(None),
                Some(s) => Ok(Some(s)),
                None if value.is_null() => Ok(None),
                None => Err(ConfigError::invalid(
                    self.key(field),
                    format!("expected a scalar, found {}", describe(value)),
                )),
            },
        }
    }
}

/// Fold a mapping key into its canonical form.
///
/// Returns `None` for keys that are not scalars.
pub fn normalize_key(key: &Value) -> Option<String> {
    scalar_to_string(key).map(|k| k.trim().trim_start_matches(':').to_ascii_lowercase())
}

/// Render a scalar YAML value as text.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_db_settings_full() {
        let db = DbSettings::from_mapping(&mapping(
            "adapter: postgres\nuser: a\npassword: b\nhost: h\nport: 5432\nname: db",
        ))
        .unwrap();
        assert_eq!(db.adapter, "postgres");
        assert_eq!(db.user.as_deref(), Some("a"));
        assert_eq!(db.password.as_deref(), Some("b"));
        assert_eq!(db.host.as_deref(), Some("h"));
        assert_eq!(db.port, Some(5432));
        assert_eq!(db.name.as_deref(), Some("db"));
    }

    #[test]
    fn test_db_keys_are_case_and_symbol_insensitive() {
        let db = DbSettings::from_mapping(&mapping(
            "':adapter': SQLite\nNAME: gateway.db\n':Port': '5433'",
        ))
        .unwrap();
        assert_eq!(db.adapter, "sqlite");
        assert_eq!(db.name.as_deref(), Some("gateway.db"));
        assert_eq!(db.port, Some(5433));
    }

    #[test]
    fn test_db_empty_values_are_absent() {
        let db = DbSettings::from_mapping(&mapping("adapter: mysql\nuser: ''\npassword:\nhost: db")).unwrap();
        assert_eq!(db.user, None);
        assert_eq!(db.password, None);
        assert_eq!(db.host.as_deref(), Some("db"));
    }

    #[test]
    fn test_db_missing_adapter() {
        let err = DbSettings::from_mapping(&mapping("name: x.db")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref key } if key == "db.adapter"));
    }

    #[test]
    fn test_db_invalid_port() {
        let err = DbSettings::from_mapping(&mapping("adapter: postgres\nport: 99999")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "db.port"));
    }

    #[test]
    fn test_db_non_scalar_value() {
        let err = DbSettings::from_mapping(&mapping("adapter: postgres\nhost: [a, b]")).unwrap_err();
        assert!(err.to_string().contains("db.host"));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("Fatal".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Fatal.as_filter_directive(), "error");
    }

    #[test]
    fn test_log_settings() {
        let log = LogSettings::from_mapping(&mapping(
            "log_level: DEBUG\nfile: straight.log\nraise_exception: true\nname: gw\nemail_config:\n  to: ops@example.com",
        ))
        .unwrap();
        assert_eq!(log.log_level, LogLevel::Debug);
        assert_eq!(log.file, "straight.log");
        assert!(log.raise_exception);
        assert_eq!(log.name.as_deref(), Some("gw"));
        assert!(log.email_config.unwrap().contains_key("to"));
    }

    #[test]
    fn test_log_settings_defaults() {
        let log = LogSettings::from_mapping(&mapping("log_level: info\nfile: a.log")).unwrap();
        assert!(!log.raise_exception);
        assert_eq!(log.name, None);
        assert_eq!(log.email_config, None);
    }

    #[test]
    fn test_log_settings_missing_file() {
        let err = LogSettings::from_mapping(&mapping("log_level: info")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref key } if key == "logmaster.file"));
    }
}
