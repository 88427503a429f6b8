//! Connection descriptors and connection-string assembly.
//!
//! # Design Decisions
//! - File-based adapters resolve `name` inside the configuration directory
//!   and ignore network fields
//! - Dependent fields are validated up front (a port needs a host, a
//!   password needs a user), so serialization never has to invent a segment
//! - Network descriptors are assembled through [`Url`], so reserved
//!   characters in credentials and names are percent-encoded
//! - `to_connection_string` is pure; only the driver touches the network

use std::fmt;
use std::path::Path;

use url::Url;

use crate::config::{ConfigError, DbSettings};

/// Adapters whose database is a file on local disk.
pub const FILE_BASED_ADAPTERS: &[&str] = &["sqlite", "sqlite3"];

/// Raw, unvalidated connection fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParts {
    pub adapter: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
}

/// A validated, normalized description of the database to connect to.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    adapter: String,
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    name: Option<String>,
    /// Rendered form once a host is known.
    url: Option<Url>,
}

impl ConnectionDescriptor {
    /// Derive the descriptor for the configured database.
    pub fn build(db: &DbSettings, config_dir: &Path) -> Result<Self, ConfigError> {
        let parts = ConnectionParts {
            adapter: db.adapter.clone(),
            user: db.user.clone(),
            password: db.password.clone(),
            host: db.host.clone(),
            port: db.port,
            name: db.name.clone(),
        };

        if !is_file_based(&parts.adapter) {
            return Self::from_parts(parts);
        }

        if parts.user.is_some() || parts.password.is_some() || parts.host.is_some() || parts.port.is_some() {
            tracing::warn!(
                adapter = %parts.adapter,
                "Ignoring user, password, host and port for a file-based database"
            );
        }
        let name = parts
            .name
            .ok_or_else(|| ConfigError::missing(format!("{}.name", DbSettings::SECTION)))?;

        Self::from_parts(ConnectionParts {
            adapter: parts.adapter,
            name: Some(config_dir.join(name).to_string_lossy().into_owned()),
            ..ConnectionParts::default()
        })
    }

    /// Validate raw parts.
    pub fn from_parts(parts: ConnectionParts) -> Result<Self, ConfigError> {
        let section = DbSettings::SECTION;
        let adapter = parts.adapter.trim().to_ascii_lowercase();
        if adapter.is_empty() {
            return Err(ConfigError::missing(format!("{section}.adapter")));
        }
        if parts.password.is_some() && parts.user.is_none() {
            return Err(ConfigError::invalid(
                format!("{section}.password"),
                "a password requires a user",
            ));
        }
        if parts.port.is_some() && parts.host.is_none() {
            return Err(ConfigError::invalid(
                format!("{section}.port"),
                "a port requires a host",
            ));
        }
        if parts.user.is_some() && parts.host.is_none() {
            return Err(ConfigError::invalid(
                format!("{section}.user"),
                "credentials require a host",
            ));
        }

        let url = match &parts.host {
            Some(host) => Some(network_url(&adapter, host, &parts)?),
            None => None,
        };

        Ok(Self {
            adapter,
            user: parts.user,
            password: parts.password,
            host: parts.host,
            port: parts.port,
            name: parts.name,
            url,
        })
    }

    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Database name, or the resolved file path for file-based adapters.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_file_based(&self) -> bool {
        is_file_based(&self.adapter)
    }

    /// `adapter://[user[:password]@]host[:port][/name]`, optional segments omitted.
    pub fn to_connection_string(&self) -> String {
        self.render(self.password.as_deref())
    }

    /// The connection string with the password masked, for logs and errors.
    pub fn redacted(&self) -> String {
        self.render(self.password.as_ref().map(|_| "***"))
    }

    fn render(&self, password: Option<&str>) -> String {
        if let Some(url) = &self.url {
            let mut url = url.clone();
            if self.password.is_some() {
                let _ = url.set_password(password);
            }
            return url.into();
        }

        // No host, hence no credentials or port either.
        let mut out = format!("{}://", self.adapter);
        if let Some(name) = &self.name {
            out.push_str(name);
        }
        out
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionDescriptor")
            .field(&self.redacted())
            .finish()
    }
}

fn network_url(adapter: &str, host: &str, parts: &ConnectionParts) -> Result<Url, ConfigError> {
    let section = DbSettings::SECTION;
    let invalid = |field: &str, reason: String| ConfigError::invalid(format!("{section}.{field}"), reason);

    let mut url = Url::parse(&format!("{adapter}://localhost"))
        .map_err(|e| invalid("adapter", format!("not usable as a URL scheme: {e}")))?;
    url.set_host(Some(host))
        .map_err(|e| invalid("host", e.to_string()))?;
    url.set_port(parts.port)
        .map_err(|()| invalid("port", "cannot be set on this URL".into()))?;
    if let Some(user) = &parts.user {
        url.set_username(user)
            .map_err(|()| invalid("user", "cannot be set on this URL".into()))?;
    }
    if let Some(password) = &parts.password {
        url.set_password(Some(password))
            .map_err(|()| invalid("password", "cannot be set on this URL".into()))?;
    }
    if let Some(name) = &parts.name {
        url.set_path("/");
        url.path_segments_mut()
            .map_err(|()| invalid("name", "cannot be set on this URL".into()))?
            .pop_if_empty()
            .push(name);
    }
    Ok(url)
}

fn is_file_based(adapter: &str) -> bool {
    FILE_BASED_ADAPTERS
        .iter()
        .any(|a| a.eq_ignore_ascii_case(adapter))
}
