//! The plugin connector: a module's entry points behind the host's
//! connector interface.
//!
//! ## Architecture
//!
//! ```text
//!   Host                      PluginConnector                 Module
//! ┌──────────────┐         ┌───────────────────┐          ┌────────────────┐
//! │ login flow   │────────▶│ login_url()       │─────────▶│ LoginURL(p,..) │
//! │ callback     │────────▶│ handle_callback() │─────────▶│ HandleCallback │
//! │ token refresh│────────▶│ refresh()         │─────────▶│ Refresh (opt.) │
//! └──────────────┘         │                   │◀─────────│ p.configuration│
//!                          │ impl Plugin       │◀─────────│ p.logger()     │
//!                          └───────────────────┘          └────────────────┘
//! ```
//!
//! Entry points are plain functions. Each call passes the connector itself
//! as the `Plugin` context, so the module pulls its configuration and logger
//! from there instead of capturing state.

use std::fmt;
use std::sync::Arc;

use plugin_connector_sdk::{
    BoxError, CallbackRequest, HandleCallbackFn, Identity, LoginUrlFn, Logger, Plugin, RefreshFn,
    Scopes, Signature,
};
use tokio_util::sync::CancellationToken;

use crate::error::{ConnectorError, OpenError, Operation, Result};
use crate::loader::ModuleSymbols;
use crate::verify::resolve;

/// Connector that redirects the user to an upstream login page and handles
/// the callback.
pub trait CallbackConnector: Send + Sync {
    /// URL to redirect the user to.
    fn login_url(&self, scopes: &Scopes, callback_url: &str, state: &str) -> Result<String>;

    /// Turn the upstream callback into an identity.
    fn handle_callback(&self, scopes: &Scopes, request: &CallbackRequest) -> Result<Identity>;
}

/// Connector that can refresh an identity without user interaction.
pub trait RefreshConnector: Send + Sync {
    /// Refresh `identity`. Cancellation is left to the implementation.
    fn refresh(
        &self,
        cancel: &CancellationToken,
        scopes: &Scopes,
        identity: &Identity,
    ) -> Result<Identity>;
}

/// Connector backed by a loaded module.
///
/// Immutable after construction and safe to share across threads; whether
/// concurrent calls are safe inside the module is up to the module.
pub struct PluginConnector {
    logger: Arc<dyn Logger>,
    config_json: Vec<u8>,
    login_url: LoginUrlFn,
    handle_callback: HandleCallbackFn,
    refresh: Option<RefreshFn>,
    module: String,
}

impl PluginConnector {
    /// Resolve, verify and bind the module's entry points, then run its
    /// `Init` hook.
    ///
    /// Nothing in the module is called unless every exported entry point
    /// checks out. A failing `Init` discards the connector and its error is
    /// returned unchanged inside [`OpenError::Init`].
    pub fn from_module(
        module: &dyn ModuleSymbols,
        config_json: impl Into<Vec<u8>>,
        logger: Arc<dyn Logger>,
    ) -> std::result::Result<Self, OpenError> {
        let description = module.describe();

        let login_url = resolve(module, &Signature::LOGIN_URL)?
            .ok_or(OpenError::MissingSymbol(Signature::LOGIN_URL.symbol))?;
        let handle_callback = resolve(module, &Signature::HANDLE_CALLBACK)?
            .ok_or(OpenError::MissingSymbol(Signature::HANDLE_CALLBACK.symbol))?;
        let refresh = resolve(module, &Signature::REFRESH)?;
        let init = resolve(module, &Signature::INIT)?;

        // SAFETY: each record's signature was verified against the field
        // read below.
        let connector = unsafe {
            Self {
                logger,
                config_json: config_json.into(),
                login_url: login_url.func().login_url,
                handle_callback: handle_callback.func().handle_callback,
                refresh: refresh.map(|entry| entry.func().refresh),
                module: description,
            }
        };

        if connector.refresh.is_none() {
            tracing::warn!(
                module = %connector.module,
                "Module does not export Refresh, refresh requests will be rejected"
            );
        }

        if let Some(init) = init {
            // SAFETY: verified against Signature::INIT
            let init = unsafe { init.func().init };
            if let Err(e) = init(&connector) {
                tracing::error!(module = %connector.module, error = %e, "Module Init failed");
                return Err(OpenError::Init(e));
            }
            tracing::debug!(module = %connector.module, "Module initialized");
        }

        Ok(connector)
    }

    /// Whether the module exports `Refresh`.
    pub fn supports_refresh(&self) -> bool {
        self.refresh.is_some()
    }

    /// Name of the module the connector was built from.
    pub fn module(&self) -> &str {
        &self.module
    }

    fn call_failed(operation: Operation) -> impl FnOnce(BoxError) -> ConnectorError {
        move |source| ConnectorError::Module { operation, source }
    }
}

impl Plugin for PluginConnector {
    fn configuration(&self) -> &[u8] {
        &self.config_json
    }

    fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }
}

impl CallbackConnector for PluginConnector {
    fn login_url(&self, scopes: &Scopes, callback_url: &str, state: &str) -> Result<String> {
        (self.login_url)(self, scopes, callback_url, state)
            .map_err(Self::call_failed(Operation::LoginUrl))
    }

    fn handle_callback(&self, scopes: &Scopes, request: &CallbackRequest) -> Result<Identity> {
        (self.handle_callback)(self, scopes, request)
            .map_err(Self::call_failed(Operation::HandleCallback))
    }
}

impl RefreshConnector for PluginConnector {
    fn refresh(
        &self,
        cancel: &CancellationToken,
        scopes: &Scopes,
        identity: &Identity,
    ) -> Result<Identity> {
        let Some(refresh) = self.refresh else {
            return Err(ConnectorError::RefreshNotImplemented);
        };
        refresh(self, cancel, scopes, identity).map_err(Self::call_failed(Operation::Refresh))
    }
}

impl fmt::Debug for PluginConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginConnector")
            .field("module", &self.module)
            .field("config_len", &self.config_json.len())
            .field("refresh", &self.refresh.is_some())
            .finish()
    }
}
