//! Host-side logger lent to modules.

use plugin_connector_sdk::{Level, Logger};

/// Forwards module log lines to `tracing`, tagged with the connector id.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    connector: String,
}

impl TracingLogger {
    pub fn new(connector: impl Into<String>) -> Self {
        Self {
            connector: connector.into(),
        }
    }

    pub fn connector(&self) -> &str {
        &self.connector
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        let connector = self.connector.as_str();
        match level {
            Level::Error => {
                tracing::error!(target: "plugin_connector::module", connector, "{}", message)
            }
            Level::Warn => {
                tracing::warn!(target: "plugin_connector::module", connector, "{}", message)
            }
            Level::Info => {
                tracing::info!(target: "plugin_connector::module", connector, "{}", message)
            }
            Level::Debug => {
                tracing::debug!(target: "plugin_connector::module", connector, "{}", message)
            }
            Level::Trace => {
                tracing::trace!(target: "plugin_connector::module", connector, "{}", message)
            }
        }
    }
}
