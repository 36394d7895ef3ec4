//
//  atlas-client
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! Settings used to build an [`AtlasClient`](crate::api::AtlasClient): the
//! server address, an optional token, the API generation and TLS trust.
//!
//! ## Sources
//!
//! Configuration is layered, later sources winning:
//!
//! 1. [`ClientConfig::default`]
//! 2. `config.toml` in the platform config directory ([`ClientConfig::load`])
//! 3. Environment variables ([`ClientConfig::apply_env`])
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ATLAS_ADDRESS` | `address` |
//! | `ATLAS_TOKEN` | `token` |
//! | `ATLAS_CAFILE` | `tls.ca_file` |
//! | `ATLAS_CAPATH` | `tls.ca_path` |
//! | `ATLAS_TLS_NOVERIFY` | `tls.insecure` (any value but empty, `0` or `false`) |
//!
//! ## Configuration File Location
//!
//! - **Linux**: `~/.config/atlas-client/config.toml`
//! - **macOS**: `~/Library/Application Support/atlas-client/config.toml`
//! - **Windows**: `C:\Users\<User>\AppData\Roaming\atlas-client\config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! address = "https://atlas.example.com"
//! protocol = "header-token"
//!
//! [tls]
//! ca_file = "/etc/ssl/atlas-ca.pem"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Protocol;

/// Address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "https://atlas.hashicorp.com";

/// Overrides [`ClientConfig::address`].
pub const ENV_ADDRESS: &str = "ATLAS_ADDRESS";
/// Overrides [`ClientConfig::token`].
pub const ENV_TOKEN: &str = "ATLAS_TOKEN";
/// PEM file of extra trusted CA certificates.
pub const ENV_CA_FILE: &str = "ATLAS_CAFILE";
/// Directory of PEM files of extra trusted CA certificates.
pub const ENV_CA_PATH: &str = "ATLAS_CAPATH";
/// Disables certificate verification unless set to `0` or `false`.
pub const ENV_TLS_NOVERIFY: &str = "ATLAS_TLS_NOVERIFY";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read or written.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path of the config file
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ClientConfig`].
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Path of the config file
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The configuration could not be rendered as TOML.
    #[error("Failed to write configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The platform has no per-user config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Settings for one client.
///
/// # Examples
///
/// ```rust
/// use atlas_client::auth::Protocol;
/// use atlas_client::config::ClientConfig;
///
/// let config: ClientConfig = toml::from_str(r#"
///     address = "https://atlas.example.com"
///     protocol = "header-token"
/// "#).unwrap();
///
/// assert_eq!(config.protocol, Protocol::HeaderToken);
/// assert_eq!(config.token, None);
/// assert!(!config.tls.insecure);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the server, optionally with a path prefix.
    #[serde(default = "default_address")]
    pub address: String,

    /// Access token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// API generation to speak.
    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default)]
    pub tls: TlsConfig,
}

/// TLS trust settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// A PEM file of extra trusted roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<PathBuf>,

    /// A directory whose `.pem`/`.crt` files are extra trusted roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_path: Option<PathBuf>,

    /// Skip certificate verification entirely.
    #[serde(default)]
    pub insecure: bool,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: None,
            protocol: Protocol::default(),
            tls: TlsConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Overlays the `ATLAS_*` variables returned by `lookup`.
    ///
    /// Variables that are unset or empty leave the field unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_client::config::ClientConfig;
    ///
    /// let mut config = ClientConfig::default();
    /// config.apply_env(|name| match name {
    ///     "ATLAS_TOKEN" => Some("abc".to_string()),
    ///     "ATLAS_TLS_NOVERIFY" => Some("1".to_string()),
    ///     _ => None,
    /// });
    ///
    /// assert_eq!(config.token.as_deref(), Some("abc"));
    /// assert!(config.tls.insecure);
    /// ```
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if let Some(address) = get(ENV_ADDRESS) {
            tracing::debug!("Using address {} from {}", address, ENV_ADDRESS);
            self.address = address;
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Some(file) = get(ENV_CA_FILE) {
            self.tls.ca_file = Some(PathBuf::from(file));
        }
        if let Some(dir) = get(ENV_CA_PATH) {
            self.tls.ca_path = Some(PathBuf::from(dir));
        }
        if let Some(flag) = get(ENV_TLS_NOVERIFY) {
            self.tls.insecure = !matches!(flag.to_ascii_lowercase().as_str(), "0" | "false");
        }
    }

    /// Parses a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `config.toml` from the config directory, if present, then
    /// overlays the environment.
    ///
    /// # Errors
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use atlas_client::api::AtlasClient;
    /// use atlas_client::config::ClientConfig;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = AtlasClient::from_config(&ClientConfig::load()?)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_error)
    }

    /// Path of the default configuration file.
    ///
    /// | Platform | Path |
    /// |----------|------|
    /// | Linux | `~/.config/atlas-client/config.toml` |
    /// | macOS | `~/Library/Application Support/atlas-client/config.toml` |
    /// | Windows | `C:\Users\<User>\AppData\Roaming\atlas-client\config.toml` |
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", crate::APP_NAME).ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.address, "https://atlas.hashicorp.com");
        assert_eq!(config.protocol, Protocol::QueryToken);
        assert_eq!(config.tls, TlsConfig::default());
    }

    #[test]
    fn test_apply_env() {
        let mut config = ClientConfig::default();
        config.apply_env(lookup(&[
            ("ATLAS_ADDRESS", "https://atlas.example.com/prefix"),
            ("ATLAS_TOKEN", "abc"),
            ("ATLAS_CAFILE", "/etc/ca.pem"),
            ("ATLAS_CAPATH", "/etc/certs"),
        ]));

        assert_eq!(config.address, "https://atlas.example.com/prefix");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.tls.ca_file, Some(PathBuf::from("/etc/ca.pem")));
        assert_eq!(config.tls.ca_path, Some(PathBuf::from("/etc/certs")));
        assert!(!config.tls.insecure);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = ClientConfig {
            token: Some("keep".into()),
            ..Default::default()
        };
        config.apply_env(lookup(&[("ATLAS_TOKEN", ""), ("ATLAS_ADDRESS", "")]));

        assert_eq!(config.token.as_deref(), Some("keep"));
        assert_eq!(config.address, DEFAULT_ADDRESS);
    }

    #[test]
    fn test_tls_noverify_values() {
        for (value, expected) in [("1", true), ("yes", true), ("0", false), ("FALSE", false)] {
            let mut config = ClientConfig::default();
            config.apply_env(lookup(&[("ATLAS_TLS_NOVERIFY", value)]));
            assert_eq!(config.tls.insecure, expected, "value {:?}", value);
        }
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "address = \"https://atlas.example.com\"\n\n[tls]\ninsecure = true\n",
        )
        .unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.address, "https://atlas.example.com");
        assert!(config.tls.insecure);
        assert_eq!(config.protocol, Protocol::QueryToken);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = TempDir::new().unwrap();

        let missing = ClientConfig::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "address = [").unwrap();
        let bad = ClientConfig::from_file(&path).unwrap_err();
        assert!(matches!(bad, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_save_to_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ClientConfig {
            protocol: Protocol::HeaderToken,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(ClientConfig::from_file(&path).unwrap(), config);
    }
}
