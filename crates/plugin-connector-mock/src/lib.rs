//! Mock connector module.
//!
//! Logs every user in as the identity written in its configuration:
//!
//! ```json
//! {
//!   "userId": "0-385-28089-0",
//!   "username": "kilgore",
//!   "email": "kilgore@kilgore.trout",
//!   "groups": ["authors"],
//!   "authURL": "https://upstream.example.com/authorize"
//! }
//! ```
//!
//! Without `authURL` the login URL points straight back at the host's
//! callback, so a login completes without any upstream.

use plugin_connector_sdk::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MockConfig {
    user_id: String,
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default, rename = "authURL")]
    auth_url: Option<String>,
}

impl MockConfig {
    fn load(plugin: &dyn Plugin) -> PluginResult<Self> {
        let config: MockConfig = parse_config(plugin)?;
        if config.username.is_empty() {
            return Err(PluginError::InvalidConfig(
                "username must not be empty".to_string(),
            ));
        }
        Ok(config)
    }

    fn identity(&self, scopes: &Scopes) -> Identity {
        let identity = Identity::new(&self.user_id, &self.username)
            .with_email(&self.email, !self.email.is_empty())
            .with_connector_data(self.user_id.as_bytes());
        if scopes.groups {
            identity.with_groups(self.groups.iter().cloned())
        } else {
            identity
        }
    }
}

fn append_query(base: &str, pairs: &[(&str, &str)]) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    let query = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}{}{}", base, separator, query)
}

/// Validate the configuration once, at startup.
pub fn init(plugin: &dyn Plugin) -> Result<(), BoxError> {
    let config = MockConfig::load(plugin)
        .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;
    plugin
        .logger()
        .info(&format!("mock connector ready for user {}", config.username));
    Ok(())
}

pub fn login_url(
    plugin: &dyn Plugin,
    _scopes: &Scopes,
    callback_url: &str,
    state: &str,
) -> Result<String, BoxError> {
    let config = MockConfig::load(plugin)?;
    let url = match &config.auth_url {
        Some(auth_url) => append_query(
            auth_url,
            &[("redirect_uri", callback_url), ("state", state)],
        ),
        None => append_query(callback_url, &[("state", state)]),
    };
    plugin.logger().debug(&format!("login URL: {}", url));
    Ok(url)
}

pub fn handle_callback(
    plugin: &dyn Plugin,
    scopes: &Scopes,
    request: &CallbackRequest,
) -> Result<Identity, BoxError> {
    let config = MockConfig::load(plugin)?;
    if request.query_param("state").is_none() {
        return Err(PluginError::InvalidCallback("missing state parameter".to_string()).into());
    }
    if let Some(error) = request.query_param("error") {
        return Err(PluginError::Upstream(error).into());
    }
    Ok(config.identity(scopes))
}

pub fn refresh(
    plugin: &dyn Plugin,
    cancel: &CancellationToken,
    scopes: &Scopes,
    identity: &Identity,
) -> Result<Identity, BoxError> {
    if cancel.is_cancelled() {
        return Err(PluginError::Cancelled.into());
    }
    let config = MockConfig::load(plugin)?;
    if identity.connector_data != config.user_id.as_bytes() {
        return Err(PluginError::Upstream(format!("unknown user {}", identity.user_id)).into());
    }
    Ok(config.identity(scopes))
}

export_init!(init);
export_login_url!(login_url);
export_handle_callback!(handle_callback);
export_refresh!(refresh);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryLogger(Mutex<Vec<String>>);

    impl Logger for MemoryLogger {
        fn log(&self, level: Level, message: &str) {
            self.0.lock().unwrap().push(format!("{} {}", level, message));
        }
    }

    struct TestPlugin {
        config: &'static str,
        logger: MemoryLogger,
    }

    impl TestPlugin {
        fn new(config: &'static str) -> Self {
            Self {
                config,
                logger: MemoryLogger::default(),
            }
        }
    }

    impl Plugin for TestPlugin {
        fn configuration(&self) -> &[u8] {
            self.config.as_bytes()
        }

        fn logger(&self) -> &dyn Logger {
            &self.logger
        }
    }

    const CONFIG: &str = r#"{
        "userId": "0-385-28089-0",
        "username": "kilgore",
        "email": "kilgore@kilgore.trout",
        "groups": ["authors"]
    }"#;

    #[test]
    fn test_init_logs_through_host_logger() {
        let plugin = TestPlugin::new(CONFIG);
        init(&plugin).unwrap();

        let lines = plugin.logger.0.lock().unwrap();
        assert_eq!(lines.as_slice(), ["info mock connector ready for user kilgore"]);
    }

    #[test]
    fn test_init_rejects_empty_username() {
        let plugin = TestPlugin::new(r#"{"userId": "1", "username": ""}"#);
        let err = init(&plugin).unwrap_err();
        assert!(err.to_string().contains("username must not be empty"));
    }

    #[test]
    fn test_login_url_without_upstream() {
        let plugin = TestPlugin::new(CONFIG);
        let url = login_url(&plugin, &Scopes::default(), "https://idp/callback", "a b").unwrap();
        assert_eq!(url, "https://idp/callback?state=a%20b");
    }

    #[test]
    fn test_login_url_with_upstream() {
        let plugin = TestPlugin::new(
            r#"{"userId": "1", "username": "u", "authURL": "https://up/authorize?x=1"}"#,
        );
        let url = login_url(&plugin, &Scopes::default(), "https://idp/cb", "s").unwrap();
        assert_eq!(
            url,
            "https://up/authorize?x=1&redirect_uri=https%3A%2F%2Fidp%2Fcb&state=s"
        );
    }

    #[test]
    fn test_handle_callback_groups_scope() {
        let plugin = TestPlugin::new(CONFIG);
        let request = CallbackRequest::get("/callback?state=s");

        let without = handle_callback(&plugin, &Scopes::default(), &request).unwrap();
        assert_eq!(without.username, "kilgore");
        assert!(without.email_verified);
        assert!(without.groups.is_empty());

        let with = handle_callback(&plugin, &Scopes::all(), &request).unwrap();
        assert_eq!(with.groups, vec!["authors".to_string()]);
    }

    #[test]
    fn test_handle_callback_errors() {
        let plugin = TestPlugin::new(CONFIG);

        let err = handle_callback(&plugin, &Scopes::default(), &CallbackRequest::get("/callback"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::InvalidCallback(_))
        ));

        let request = CallbackRequest::get("/callback?state=s&error=access_denied");
        let err = handle_callback(&plugin, &Scopes::default(), &request).unwrap_err();
        assert_eq!(err.to_string(), "Upstream error: access_denied");
    }

    #[test]
    fn test_refresh() {
        let plugin = TestPlugin::new(CONFIG);
        let identity = handle_callback(
            &plugin,
            &Scopes::default(),
            &CallbackRequest::get("/callback?state=s"),
        )
        .unwrap();

        let refreshed = refresh(&plugin, &CancellationToken::new(), &Scopes::all(), &identity)
            .unwrap();
        assert_eq!(refreshed.groups, vec!["authors".to_string()]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = refresh(&plugin, &cancel, &Scopes::all(), &identity).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PluginError>(),
            Some(PluginError::Cancelled)
        ));

        let stranger = Identity::new("2", "someone").with_connector_data("2");
        assert!(refresh(&plugin, &CancellationToken::new(), &Scopes::all(), &stranger).is_err());
    }

    #[test]
    fn test_exported_records() {
        assert_eq!(
            unsafe { LoginURL.signature_bytes() },
            Signature::LOGIN_URL.text.as_bytes()
        );
        assert_eq!(
            unsafe { Refresh.signature_bytes() },
            Signature::REFRESH.text.as_bytes()
        );
    }
}
