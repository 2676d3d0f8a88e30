//! Connection settings for a [`Client`](crate::client::Client).
//!
//! Settings are plain data: build them in code or read them from a TOML
//! file such as
//!
//! ```toml
//! dns = "localhost:9080"
//! username = "groot"
//! password = "password"
//! namespace = 0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credentials and address of the graph database.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Address of the database endpoint.
    pub dns: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Tenant namespace, 0 for the default one.
    #[serde(default)]
    pub namespace: u64,
}

impl ClientConfig {
    /// Settings for the default namespace.
    pub fn new(dns: &str, username: &str, password: &str) -> Self {
        Self {
            dns: dns.to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
            namespace: 0,
        }
    }

    /// Returns a copy targeting `namespace`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: u64) -> Self {
        self.namespace = namespace;
        self
    }

    /// Parses settings from TOML text and validates them.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: None,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads settings from a TOML file and validates them.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the settings as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|source| ConfigError::Serialize { source })
    }

    /// Checks that the address and both credentials are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("dns", &self.dns),
            ("username", &self.username),
            ("password", &self.password),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { field });
            }
        }
        Ok(())
    }
}

/// Failures while reading or checking client settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read client config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The settings are not valid TOML for [`ClientConfig`].
    #[error("failed to parse client config: {source}")]
    Parse {
        /// File that was parsed, if any.
        path: Option<PathBuf>,
        /// Underlying parse failure.
        source: toml::de::Error,
    },
    /// The settings could not be serialized.
    #[error("failed to serialize client config: {source}")]
    Serialize {
        /// Underlying serializer failure.
        source: toml::ser::Error,
    },
    /// A required setting is empty.
    #[error("{field} is required")]
    Missing {
        /// Name of the empty setting.
        field: &'static str,
    },
}
