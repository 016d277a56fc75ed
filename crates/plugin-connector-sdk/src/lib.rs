//! Plugin Connector SDK
//!
//! The contract between an identity-federation host and a connector module
//! that the host loads at runtime from a shared library.
//!
//! A module exports up to four entry points by name:
//!
//! | Symbol           | Required | Function type        |
//! |------------------|----------|----------------------|
//! | `LoginURL`       | yes      | [`LoginUrlFn`]       |
//! | `HandleCallback` | yes      | [`HandleCallbackFn`] |
//! | `Refresh`        | no       | [`RefreshFn`]        |
//! | `Init`           | no       | [`InitFn`]           |
//!
//! Every entry point is a plain function whose first argument is the
//! [`Plugin`] context. The host passes itself as that context, so the module
//! reads its configuration and logger from it instead of keeping state.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use plugin_connector_sdk::prelude::*;
//!
//! fn login_url(
//!     plugin: &dyn Plugin,
//!     _scopes: &Scopes,
//!     callback_url: &str,
//!     state: &str,
//! ) -> Result<String, BoxError> {
//!     plugin.logger().debug("building login URL");
//!     Ok(format!("{}?state={}", callback_url, state))
//! }
//!
//! export_login_url!(login_url);
//! ```
//!
//! # Trust boundary
//!
//! Loading a shared library runs its static initializers before any symbol
//! is looked up. Module paths are trusted input for the host.
//!
//! Modules and host must be built with the same compiler and the same
//! version of this crate. The ABI version and the signature strings carried
//! by every [`EntryPoint`] let the host reject a skewed module before any
//! call is made.

pub mod context;
pub mod descriptor;
pub mod error;
#[macro_use]
pub mod macros;
pub mod types;

pub use context::{parse_config, Level, Logger, Plugin};
pub use descriptor::{
    EntryFn, EntryPoint, HandleCallbackFn, InitFn, LoginUrlFn, RefreshFn, Signature,
    ENTRY_POINT_ABI_VERSION,
};
pub use error::{BoxError, PluginError, PluginResult};
pub use types::{CallbackRequest, Identity, Scopes};

pub use tokio_util::sync::CancellationToken;

/// Prelude module with common imports
pub mod prelude {
    pub use crate::context::{parse_config, Level, Logger, Plugin};
    pub use crate::descriptor::{EntryPoint, Signature};
    pub use crate::error::{BoxError, PluginError, PluginResult};
    pub use crate::types::{CallbackRequest, Identity, Scopes};
    pub use tokio_util::sync::CancellationToken;

    // Macros are automatically available due to #[macro_use]
    pub use crate::{export_handle_callback, export_init, export_login_url, export_refresh};
}
