//! Gate configuration, loaded from TOML.
//!
//! ```toml
//! use_gateway_defaults = true
//!
//! [credential]
//! header = "authorization"
//!
//! [key_cache]
//! ttl_secs = 300
//! purge_interval_secs = 30
//!
//! [operations]
//! GetAccount = ["read_only", "write", "admin"]
//! ExportAuditLog = ["admin"]
//! ```
//!
//! Every section is optional. Entries under `[operations]` are added to the
//! built-in gateway table, replacing a built-in entry of the same name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::{MemoryKeyCache, DEFAULT_KEY_CACHE_TTL, DEFAULT_PURGE_INTERVAL};
use crate::credential::AUTHORIZATION_HEADER;
use crate::operation::{OperationTable, TableError};
use crate::role::AllowedRoles;

/// Top-level gate configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Where the credential is read from
    #[serde(default)]
    pub credential: CredentialConfig,

    /// In-process key cache settings
    #[serde(default)]
    pub key_cache: KeyCacheConfig,

    /// Start from the built-in gateway operation table
    #[serde(default = "default_use_gateway_defaults")]
    pub use_gateway_defaults: bool,

    /// Explicit per-operation role sets
    #[serde(default)]
    pub operations: BTreeMap<String, AllowedRoles>,
}

/// `[credential]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    /// Metadata key holding the API key
    #[serde(default = "default_header")]
    pub header: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
        }
    }
}

/// `[key_cache]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyCacheConfig {
    /// How long a cached key record stays valid
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// How often the owner of the cache should purge expired records
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for KeyCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

impl KeyCacheConfig {
    /// Record lifetime as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Purge interval as a `Duration`.
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    /// Builds an empty in-process cache with the configured TTL.
    pub fn build(&self) -> MemoryKeyCache {
        MemoryKeyCache::new(self.ttl())
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            credential: CredentialConfig::default(),
            key_cache: KeyCacheConfig::default(),
            use_gateway_defaults: default_use_gateway_defaults(),
            operations: BTreeMap::new(),
        }
    }
}

impl GateConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML or unknown keys and
    /// `ConfigError::Invalid` for values that parse but cannot be used.
    ///
    /// # Examples
    ///
    /// ```
    /// use apikey_gate::{GateConfig, Role};
    ///
    /// let config = GateConfig::from_toml_str(r#"
    ///     [operations]
    ///     ExportAuditLog = ["admin"]
    /// "#).unwrap();
    ///
    /// let table = config.operation_table().unwrap();
    /// let allowed = table.allowed_roles("ExportAuditLog").unwrap();
    /// assert!(allowed.contains(Role::Admin));
    /// assert!(!allowed.contains(Role::Write));
    /// assert!(table.contains("GetAccount"));
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` when the file cannot be read, otherwise
    /// the same errors as [`from_toml_str`](Self::from_toml_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            operations = config.operations.len(),
            use_gateway_defaults = config.use_gateway_defaults,
            "loaded gate configuration"
        );
        Ok(config)
    }

    /// Builds the operation table this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Table` when an entry is unusable, such as an
    /// operation with an empty role list.
    pub fn operation_table(&self) -> Result<OperationTable, ConfigError> {
        let explicit = self
            .operations
            .iter()
            .fold(OperationTable::builder(), |builder, (name, roles)| {
                builder.allow(name.clone(), *roles)
            })
            .build()?;

        let table = if self.use_gateway_defaults {
            OperationTable::gateway_defaults().merged_with(explicit)
        } else {
            explicit
        };
        if table.is_empty() {
            return Err(ConfigError::Invalid(
                "no operations configured and gateway defaults disabled".to_string(),
            ));
        }
        Ok(table)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.credential.header.trim().is_empty() {
            return Err(ConfigError::Invalid("credential.header must not be empty".to_string()));
        }
        if self.key_cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("key_cache.ttl_secs must be positive".to_string()));
        }
        if self.key_cache.purge_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "key_cache.purge_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors raised while loading gate configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The TOML was malformed or had unknown keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value parsed but cannot be used.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// The operation table could not be built.
    #[error("invalid operation table: {0}")]
    Table(#[from] TableError),
}

fn default_header() -> String {
    AUTHORIZATION_HEADER.to_string()
}

fn default_ttl_secs() -> u64 {
    DEFAULT_KEY_CACHE_TTL.as_secs()
}

fn default_purge_interval_secs() -> u64 {
    DEFAULT_PURGE_INTERVAL.as_secs()
}

fn default_use_gateway_defaults() -> bool {
    true
}
