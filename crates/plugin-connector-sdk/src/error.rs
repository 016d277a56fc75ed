//! Plugin error types.

/// Error type returned by entry points.
///
/// The host never inspects it; it is handed back to the host's caller as the
/// `source` of the failed operation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Ready-made error type for modules that don't need their own.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The callback request could not be handled
    #[error("Invalid callback: {0}")]
    InvalidCallback(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Upstream identity provider failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

/// Plugin result type
pub type PluginResult<T> = Result<T, PluginError>;

impl From<serde_json::Error> for PluginError {
    fn from(err: serde_json::Error) -> Self {
        PluginError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::InitializationFailed("test error".to_string());
        assert_eq!(err.to_string(), "Initialization failed: test error");
    }

    #[test]
    fn test_boxed_error_downcasts() {
        let boxed: BoxError = Box::new(PluginError::Cancelled);
        assert!(matches!(
            boxed.downcast_ref::<PluginError>(),
            Some(PluginError::Cancelled)
        ));
    }
}
