//! Plugin connectors for the identity-federation host.
//!
//! A plugin connector is an upstream identity provider implemented in a
//! shared library and chosen by configuration rather than at build time.
//!
//! Opening one goes through two stages:
//!
//! 1. **Module loader** ([`ModuleHandle`]) opens the library. Failure is an
//!    [`OpenError::Load`].
//! 2. **Capability adapter** ([`PluginConnector::from_module`]) resolves
//!    `LoginURL` and `HandleCallback` (required) and `Refresh` and `Init`
//!    (optional), checks every exported one against its expected signature,
//!    binds them, and runs `Init` once with the connector as its context.
//!
//! Either stage failing means no connector. Once built, the connector never
//! changes and is shared freely across request handlers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use plugin_connector::{CallbackConnector, ModuleConfig, TracingLogger};
//!
//! let config = ModuleConfig::from_file("connectors/upstream.json")?;
//! let connector = config.open("upstream", Arc::new(TracingLogger::new("upstream")))?;
//!
//! let url = connector.login_url(&Scopes::default(), "https://idp/callback", &state)?;
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod loader;
pub mod logging;
pub mod verify;

pub use config::ModuleConfig;
pub use connector::{CallbackConnector, PluginConnector, RefreshConnector};
pub use error::{ConfigError, ConnectorError, Mismatch, OpenError, Operation, Result};
pub use loader::{compute_sha256, ModuleHandle, ModuleSymbols, StaticModule};
pub use logging::TracingLogger;

pub use plugin_connector_sdk::{
    BoxError, CallbackRequest, CancellationToken, Identity, Logger, Plugin, Scopes,
};
