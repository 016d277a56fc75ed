//! The context capability handed to every entry point.

use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::PluginError;

/// Severity of a log line written by a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logger owned by the host and lent to the module.
///
/// Calls go through the host's vtable, so log lines end up in the host's
/// subscriber even though the module carries its own copy of every crate.
pub trait Logger: Send + Sync {
    /// Write one log line.
    fn log(&self, level: Level, message: &str);

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }
}

/// Read-only view of the connector passed as the first argument of every
/// entry point.
pub trait Plugin: Send + Sync {
    /// The module's configuration document, exactly as the operator wrote it.
    fn configuration(&self) -> &[u8];

    /// Logger for diagnostic output.
    fn logger(&self) -> &dyn Logger;
}

/// Deserialize the module configuration.
///
/// An empty configuration is reported as [`PluginError::InvalidConfig`]
/// rather than as a JSON syntax error.
pub fn parse_config<T: DeserializeOwned>(plugin: &dyn Plugin) -> Result<T, PluginError> {
    let raw = plugin.configuration();
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(PluginError::InvalidConfig(
            "plugin configuration is empty".to_string(),
        ));
    }
    serde_json::from_slice(raw).map_err(|e| PluginError::InvalidConfig(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<(Level, String)>>,
    }

    impl Logger for RecordingLogger {
        fn log(&self, level: Level, message: &str) {
            self.lines.lock().unwrap().push((level, message.to_string()));
        }
    }

    struct TestPlugin {
        config: Vec<u8>,
        logger: RecordingLogger,
    }

    impl Plugin for TestPlugin {
        fn configuration(&self) -> &[u8] {
            &self.config
        }

        fn logger(&self) -> &dyn Logger {
            &self.logger
        }
    }

    #[derive(Debug, Deserialize)]
    struct Settings {
        issuer: String,
    }

    #[test]
    fn test_parse_config() {
        let plugin = TestPlugin {
            config: br#"{"issuer": "https://idp.example.com"}"#.to_vec(),
            logger: RecordingLogger::default(),
        };

        let settings: Settings = parse_config(&plugin).unwrap();
        assert_eq!(settings.issuer, "https://idp.example.com");
    }

    #[test]
    fn test_parse_empty_config() {
        let plugin = TestPlugin {
            config: b"  ".to_vec(),
            logger: RecordingLogger::default(),
        };

        let err = parse_config::<Settings>(&plugin).unwrap_err();
        assert!(matches!(err, PluginError::InvalidConfig(_)));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_logger_helpers() {
        let logger = RecordingLogger::default();
        logger.info("hello");
        logger.warn("careful");

        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines[0], (Level::Info, "hello".to_string()));
        assert_eq!(lines[1], (Level::Warn, "careful".to_string()));
    }
}
