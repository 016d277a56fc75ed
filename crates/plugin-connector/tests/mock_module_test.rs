//! End-to-end tests against the mock connector module.
//!
//! The mock is linked in as a regular crate for the in-process tests. The
//! shared-library test loads the built cdylib from the target directory and
//! is skipped when it has not been built.

use std::path::PathBuf;
use std::sync::Arc;

use plugin_connector::{
    compute_sha256, CallbackConnector, ModuleConfig, ModuleSymbols, OpenError, PluginConnector,
    RefreshConnector, StaticModule, TracingLogger,
};
use plugin_connector_sdk::{CallbackRequest, CancellationToken, PluginError, Scopes};

const CONFIG: &str = r#"{
    "userId": "0-385-28089-0",
    "username": "kilgore",
    "email": "kilgore@kilgore.trout",
    "groups": ["authors"]
}"#;

fn mock_module() -> StaticModule {
    StaticModule::new("mock")
        .with_entry_point("LoginURL", &plugin_connector_mock::LoginURL)
        .with_entry_point("HandleCallback", &plugin_connector_mock::HandleCallback)
        .with_entry_point("Refresh", &plugin_connector_mock::Refresh)
        .with_entry_point("Init", &plugin_connector_mock::Init)
}

fn mock_connector(config: &str) -> Result<PluginConnector, OpenError> {
    PluginConnector::from_module(
        &mock_module(),
        config,
        Arc::new(TracingLogger::new("mock")),
    )
}

#[test]
fn test_full_login_flow() {
    let connector = mock_connector(CONFIG).unwrap();
    assert!(connector.supports_refresh());

    let url = connector
        .login_url(&Scopes::all(), "https://idp/callback", "xyz")
        .unwrap();
    assert_eq!(url, "https://idp/callback?state=xyz");

    let identity = connector
        .handle_callback(&Scopes::all(), &CallbackRequest::get(url))
        .unwrap();
    assert_eq!(identity.user_id, "0-385-28089-0");
    assert_eq!(identity.email, "kilgore@kilgore.trout");
    assert_eq!(identity.groups, vec!["authors".to_string()]);

    let refreshed = connector
        .refresh(&CancellationToken::new(), &Scopes::default(), &identity)
        .unwrap();
    assert_eq!(refreshed.username, "kilgore");
    assert!(refreshed.groups.is_empty());
}

#[test]
fn test_mock_init_rejects_bad_config() {
    let err = mock_connector(r#"{"userId": "1", "username": ""}"#).unwrap_err();
    match err {
        OpenError::Init(source) => {
            let inner = source.downcast_ref::<PluginError>().unwrap();
            assert!(matches!(inner, PluginError::InitializationFailed(_)));
        }
        other => panic!("expected Init error, got {:?}", other),
    }

    assert!(matches!(mock_connector(""), Err(OpenError::Init(_))));
}

#[test]
fn test_mock_upstream_error_passes_through() {
    let connector = mock_connector(CONFIG).unwrap();
    let err = connector
        .handle_callback(
            &Scopes::default(),
            &CallbackRequest::get("/callback?state=s&error=access_denied"),
        )
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "HandleCallback failed: Upstream error: access_denied"
    );
}

#[test]
fn test_module_config_open_rejects_missing_library() {
    let config = ModuleConfig::from_json(
        r#"{"path": "/nonexistent/libconnector.so", "pluginConfig": {"username": "u"}}"#,
    )
    .unwrap();

    let err = config
        .open("missing", Arc::new(TracingLogger::new("missing")))
        .unwrap_err();
    assert!(matches!(err, OpenError::Load { .. }));
    assert!(err.to_string().starts_with("Failed to load module"));
}

fn mock_library_name() -> String {
    format!(
        "{}plugin_connector_mock{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// Look for the built mock cdylib next to this test binary.
fn find_mock_library() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let deps = exe.parent()?;
    let name = mock_library_name();

    [deps.to_path_buf(), deps.parent()?.to_path_buf()]
        .into_iter()
        .map(|dir| dir.join(&name))
        .find(|candidate| candidate.is_file())
}

#[test]
fn test_load_mock_shared_library() {
    let Some(library) = find_mock_library() else {
        eprintln!("{} not built, skipping", mock_library_name());
        return;
    };

    let digest = compute_sha256(&std::fs::read(&library).unwrap());
    let config = ModuleConfig::new(&library, CONFIG).with_sha256(digest);

    let connector = config
        .open("mock", Arc::new(TracingLogger::new("mock")))
        .unwrap();
    assert!(connector.supports_refresh());
    assert_eq!(connector.module(), library.display().to_string());

    let url = connector
        .login_url(&Scopes::default(), "https://idp/callback", "from-dylib")
        .unwrap();
    assert_eq!(url, "https://idp/callback?state=from-dylib");

    // A wrong pin stops the load before the library is opened.
    let pinned = ModuleConfig::new(&library, CONFIG).with_sha256("0".repeat(64));
    let err = pinned
        .open("mock", Arc::new(TracingLogger::new("mock")))
        .unwrap_err();
    assert!(err.to_string().contains("checksum mismatch"));
}

#[test]
fn test_static_module_lists_mock_symbols() {
    let module = mock_module();
    let mut symbols = module.symbols();
    symbols.sort_unstable();
    assert_eq!(symbols, ["HandleCallback", "Init", "LoginURL", "Refresh"]);
    assert_eq!(module.describe(), "static:mock");
}
