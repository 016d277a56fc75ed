//! Error types for connector construction and connector calls.

use std::fmt;
use std::path::PathBuf;

use plugin_connector_sdk::BoxError;

/// Result type for connector calls.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Why a connector could not be constructed.
///
/// Every variant is fatal for the connector being opened and for that
/// connector only.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    /// The module could not be opened.
    #[error("Failed to load module {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// A required entry point is not exported.
    #[error("Missing required symbol: {0}")]
    MissingSymbol(&'static str),

    /// An entry point is exported with the wrong shape.
    #[error("{symbol} does not implement required interface: {mismatch}")]
    SignatureMismatch {
        symbol: &'static str,
        mismatch: Mismatch,
    },

    /// The module's `Init` returned an error.
    #[error("Init failed: {0}")]
    Init(#[source] BoxError),
}

impl OpenError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        OpenError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// First difference found between an exported entry point and the shape the
/// host expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    AbiVersion { expected: u32, found: u32 },
    NullFunction,
    MalformedSignature(String),
    ParamCount { expected: usize, found: usize },
    Param {
        position: usize,
        expected: String,
        found: String,
    },
    Return { expected: String, found: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::AbiVersion { expected, found } => {
                write!(f, "ABI version mismatch: expected {}, found {}", expected, found)
            }
            Mismatch::NullFunction => write!(f, "function pointer is null"),
            Mismatch::MalformedSignature(text) => {
                write!(f, "malformed signature '{}'", text)
            }
            Mismatch::ParamCount { expected, found } => {
                write!(f, "expected {} parameters, found {}", expected, found)
            }
            Mismatch::Param {
                position,
                expected,
                found,
            } => write!(
                f,
                "parameter {} should be '{}', found '{}'",
                position, expected, found
            ),
            Mismatch::Return { expected, found } => {
                write!(f, "return type should be '{}', found '{}'", expected, found)
            }
        }
    }
}

/// Connector call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoginUrl,
    HandleCallback,
    Refresh,
}

impl Operation {
    /// Entry point symbol behind the operation.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::LoginUrl => "LoginURL",
            Operation::HandleCallback => "HandleCallback",
            Operation::Refresh => "Refresh",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Error returned by a connector call.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// The module returned an error; it is kept unchanged as the source.
    #[error("{operation} failed: {source}")]
    Module {
        operation: Operation,
        #[source]
        source: BoxError,
    },

    /// The module does not export `Refresh`.
    #[error("refresh() is not implemented")]
    RefreshNotImplemented,
}

impl ConnectorError {
    /// The error the module returned, if any.
    pub fn module_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ConnectorError::Module { source, .. } => Some(source.as_ref()),
            ConnectorError::RefreshNotImplemented => None,
        }
    }

    /// Take the error the module returned, if any.
    pub fn into_module_error(self) -> Option<BoxError> {
        match self {
            ConnectorError::Module { source, .. } => Some(source),
            ConnectorError::RefreshNotImplemented => None,
        }
    }

    /// The operation that failed.
    pub fn operation(&self) -> Operation {
        match self {
            ConnectorError::Module { operation, .. } => *operation,
            ConnectorError::RefreshNotImplemented => Operation::Refresh,
        }
    }
}

/// Configuration document errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid module configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid module configuration: {0}")]
    Invalid(String),
}
