//! Connector configuration.
//!
//! ```json
//! {
//!   "path": "/usr/lib/idp/connectors/libmy_connector.so",
//!   "sha256": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
//!   "pluginConfig": { "issuer": "https://idp.example.com" }
//! }
//! ```
//!
//! `pluginConfig` is never interpreted by the host. Its exact text is kept
//! and handed to the module, which parses it itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use plugin_connector_sdk::Logger;
use serde::{Deserialize, Serialize};

use crate::connector::PluginConnector;
use crate::error::{ConfigError, OpenError};
use crate::loader::ModuleHandle;

/// Configuration of one plugin connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    /// Shared library implementing the connector.
    path: PathBuf,

    /// Module configuration document, uninterpreted.
    #[serde(default, with = "raw_json", skip_serializing_if = "Vec::is_empty")]
    plugin_config: Vec<u8>,

    /// Expected SHA-256 of the module file (lowercase hex).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
}

impl ModuleConfig {
    /// Create a configuration for the module at `path`.
    pub fn new(path: impl Into<PathBuf>, plugin_config: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            plugin_config: plugin_config.into(),
            sha256: None,
        }
    }

    /// Pin the module file to a SHA-256 digest.
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into().to_ascii_lowercase());
        self
    }

    /// Parse a configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.validate()?;
        if let Some(digest) = config.sha256.as_mut() {
            digest.make_ascii_lowercase();
        }
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn plugin_config(&self) -> &[u8] {
        &self.plugin_config
    }

    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("path must not be empty".to_string()));
        }
        if let Some(digest) = &self.sha256 {
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Invalid(format!(
                    "sha256 must be 64 hex characters, got '{}'",
                    digest
                )));
            }
        }
        Ok(())
    }

    /// Open the module and build the connector.
    ///
    /// `id` only labels diagnostics; the logger is shared with the module.
    pub fn open(&self, id: &str, logger: Arc<dyn Logger>) -> Result<PluginConnector, OpenError> {
        let span = tracing::info_span!(
            "open_connector",
            connector = %id,
            path = %self.path.display()
        );
        let _enter = span.enter();

        let module = ModuleHandle::open_verified(&self.path, self.sha256.as_deref())?;
        let connector = PluginConnector::from_module(&module, self.plugin_config.clone(), logger)?;

        tracing::info!(
            refresh = connector.supports_refresh(),
            "Plugin connector ready"
        );
        Ok(connector)
    }
}

/// Keeps `pluginConfig` as its raw JSON text.
mod raw_json {
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let text = std::str::from_utf8(bytes).map_err(S::Error::custom)?;
        let raw: Box<RawValue> =
            RawValue::from_string(text.to_string()).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        match raw.get() {
            "null" => Ok(Vec::new()),
            text => Ok(text.as_bytes().to_vec()),
        }
    }
}
