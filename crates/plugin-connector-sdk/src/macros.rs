//! Declarative macros that export entry points from a connector module.
//!
//! Each macro emits a `#[no_mangle]` static under the symbol name the host
//! looks up. The function is coerced to the entry point's function type, so
//! a function with the wrong shape fails to compile in the module instead of
//! failing at load time in the host.

/// Export a `LoginURL` entry point.
///
/// # Example
///
/// ```rust,ignore
/// use plugin_connector_sdk::prelude::*;
///
/// fn login_url(
///     _plugin: &dyn Plugin,
///     _scopes: &Scopes,
///     callback_url: &str,
///     state: &str,
/// ) -> Result<String, BoxError> {
///     Ok(format!("{}?state={}", callback_url, state))
/// }
///
/// export_login_url!(login_url);
/// ```
#[macro_export]
macro_rules! export_login_url {
    ($func:path) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static LoginURL: $crate::descriptor::EntryPoint =
            $crate::descriptor::EntryPoint::login_url($func);
    };
}

/// Export a `HandleCallback` entry point.
#[macro_export]
macro_rules! export_handle_callback {
    ($func:path) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static HandleCallback: $crate::descriptor::EntryPoint =
            $crate::descriptor::EntryPoint::handle_callback($func);
    };
}

/// Export a `Refresh` entry point.
#[macro_export]
macro_rules! export_refresh {
    ($func:path) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static Refresh: $crate::descriptor::EntryPoint =
            $crate::descriptor::EntryPoint::refresh($func);
    };
}

/// Export an `Init` entry point.
///
/// The host calls it once, right after every other symbol resolved.
#[macro_export]
macro_rules! export_init {
    ($func:path) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static Init: $crate::descriptor::EntryPoint =
            $crate::descriptor::EntryPoint::init($func);
    };
}
