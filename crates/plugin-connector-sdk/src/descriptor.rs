//! Entry point records exported by connector modules.
//!
//! A module exports each entry point as a `#[no_mangle]` static
//! [`EntryPoint`]. The record carries the ABI version and the canonical
//! signature of the function next to the function pointer itself, so the
//! host can check the shape of a symbol before it ever calls through it.

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::context::Plugin;
use crate::error::BoxError;
use crate::types::{CallbackRequest, Identity, Scopes};

/// Entry point ABI version (must match the host).
///
/// Bumped whenever the layout of any type crossing the module boundary
/// changes.
pub const ENTRY_POINT_ABI_VERSION: u32 = 1;

/// `LoginURL(plugin, scopes, callback_url, state) -> url`
pub type LoginUrlFn = fn(&dyn Plugin, &Scopes, &str, &str) -> Result<String, BoxError>;

/// `HandleCallback(plugin, scopes, request) -> identity`
pub type HandleCallbackFn =
    fn(&dyn Plugin, &Scopes, &CallbackRequest) -> Result<Identity, BoxError>;

/// `Refresh(plugin, cancel, scopes, identity) -> identity`
pub type RefreshFn =
    fn(&dyn Plugin, &CancellationToken, &Scopes, &Identity) -> Result<Identity, BoxError>;

/// `Init(plugin)`
pub type InitFn = fn(&dyn Plugin) -> Result<(), BoxError>;

/// Name and canonical signature of one entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Exported symbol name.
    pub symbol: &'static str,

    /// Whether a module must export the symbol.
    pub required: bool,

    /// Canonical text, `fn(<params>) -> <return>`.
    pub text: &'static str,
}

impl Signature {
    pub const LOGIN_URL: Signature = Signature {
        symbol: "LoginURL",
        required: true,
        text: "fn(&dyn Plugin, &Scopes, &str, &str) -> Result<String, BoxError>",
    };

    pub const HANDLE_CALLBACK: Signature = Signature {
        symbol: "HandleCallback",
        required: true,
        text: "fn(&dyn Plugin, &Scopes, &CallbackRequest) -> Result<Identity, BoxError>",
    };

    pub const REFRESH: Signature = Signature {
        symbol: "Refresh",
        required: false,
        text: "fn(&dyn Plugin, &CancellationToken, &Scopes, &Identity) -> Result<Identity, BoxError>",
    };

    pub const INIT: Signature = Signature {
        symbol: "Init",
        required: false,
        text: "fn(&dyn Plugin) -> Result<(), BoxError>",
    };

    /// All entry points, in resolution order.
    pub const ALL: [Signature; 4] = [
        Signature::LOGIN_URL,
        Signature::HANDLE_CALLBACK,
        Signature::REFRESH,
        Signature::INIT,
    ];

    /// Parameter types, in order.
    pub fn params(&self) -> Vec<&'static str> {
        split_signature(self.text)
            .map(|(params, _)| params)
            .unwrap_or_default()
    }

    /// Return type.
    pub fn returns(&self) -> &'static str {
        split_signature(self.text)
            .map(|(_, returns)| returns)
            .unwrap_or_default()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbol, self.text)
    }
}

/// Split canonical signature text into parameter types and return type.
///
/// Returns `None` when the text is not of the form `fn(...) -> ...`.
pub fn split_signature(text: &str) -> Option<(Vec<&str>, &str)> {
    let rest = text.trim().strip_prefix("fn(")?;
    let (params, returns) = rest.split_once(") -> ")?;
    let params = if params.trim().is_empty() {
        Vec::new()
    } else {
        params.split(", ").map(str::trim).collect()
    };
    Some((params, returns.trim()))
}

/// Type-erased function pointer of an entry point.
///
/// Reading any field other than `raw` is only sound after the record's
/// signature has been checked against the matching [`Signature`].
#[derive(Clone, Copy)]
#[repr(C)]
pub union EntryFn {
    pub login_url: LoginUrlFn,
    pub handle_callback: HandleCallbackFn,
    pub refresh: RefreshFn,
    pub init: InitFn,
    pub raw: *const (),
}

/// Exported entry point record.
///
/// Every module exports one static of this type per entry point, under the
/// entry point's symbol name. The fields are private: the typed constructors
/// are the only safe way to build a record, and they always pair a function
/// with its real signature.
///
/// A record cannot be written out by hand:
///
/// ```compile_fail
/// use plugin_connector_sdk::{EntryFn, EntryPoint, ENTRY_POINT_ABI_VERSION};
///
/// static FORGED: EntryPoint = EntryPoint {
///     abi_version: ENTRY_POINT_ABI_VERSION,
///     signature: std::ptr::null(),
///     signature_len: 0,
///     func: EntryFn { raw: std::ptr::null() },
/// };
/// ```
///
/// and pairing arbitrary text with an arbitrary function needs `unsafe`:
///
/// ```compile_fail
/// use plugin_connector_sdk::{EntryFn, EntryPoint, Signature, ENTRY_POINT_ABI_VERSION};
///
/// static FORGED: EntryPoint = EntryPoint::raw(
///     ENTRY_POINT_ABI_VERSION,
///     Signature::LOGIN_URL.text,
///     EntryFn { raw: 0x10 as *const () },
/// );
/// ```
#[repr(C)]
pub struct EntryPoint {
    /// ABI version - must match ENTRY_POINT_ABI_VERSION
    abi_version: u32,

    /// Canonical signature text of `func`
    signature: *const u8,
    signature_len: usize,

    /// The function itself
    func: EntryFn,
}

// The pointers inside refer to immutable, 'static module data.
unsafe impl Send for EntryPoint {}
unsafe impl Sync for EntryPoint {}

impl EntryPoint {
    /// Record for a `LoginURL` implementation.
    pub const fn login_url(func: LoginUrlFn) -> Self {
        // SAFETY: `func` has exactly the type LOGIN_URL describes
        unsafe {
            Self::raw(
                ENTRY_POINT_ABI_VERSION,
                Signature::LOGIN_URL.text,
                EntryFn { login_url: func },
            )
        }
    }

    /// Record for a `HandleCallback` implementation.
    pub const fn handle_callback(func: HandleCallbackFn) -> Self {
        // SAFETY: `func` has exactly the type HANDLE_CALLBACK describes
        unsafe {
            Self::raw(
                ENTRY_POINT_ABI_VERSION,
                Signature::HANDLE_CALLBACK.text,
                EntryFn {
                    handle_callback: func,
                },
            )
        }
    }

    /// Record for a `Refresh` implementation.
    pub const fn refresh(func: RefreshFn) -> Self {
        // SAFETY: `func` has exactly the type REFRESH describes
        unsafe {
            Self::raw(
                ENTRY_POINT_ABI_VERSION,
                Signature::REFRESH.text,
                EntryFn { refresh: func },
            )
        }
    }

    /// Record for an `Init` implementation.
    pub const fn init(func: InitFn) -> Self {
        // SAFETY: `func` has exactly the type INIT describes
        unsafe {
            Self::raw(
                ENTRY_POINT_ABI_VERSION,
                Signature::INIT.text,
                EntryFn { init: func },
            )
        }
    }

    /// Record with an arbitrary ABI version and signature.
    ///
    /// # Safety
    /// If `abi_version` is [`ENTRY_POINT_ABI_VERSION`] and `signature` is the
    /// text of one of the [`Signature`] constants, `func` must have been
    /// built from the union field of that entry point's function type. The
    /// host calls through any record whose version and text check out.
    /// Records with another version or text are rejected before any call.
    pub const unsafe fn raw(abi_version: u32, signature: &'static str, func: EntryFn) -> Self {
        Self {
            abi_version,
            signature: signature.as_ptr(),
            signature_len: signature.len(),
            func,
        }
    }

    /// ABI version the record was built for.
    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// The function pointer. Reading a typed field is only sound once the
    /// signature has been checked.
    pub fn func(&self) -> EntryFn {
        self.func
    }

    /// The raw signature bytes.
    ///
    /// # Safety
    /// `signature`/`signature_len` must describe memory that stays valid for
    /// the returned lifetime. This holds for records built by the
    /// constructors above and for records exported by a library that is
    /// never unloaded.
    pub unsafe fn signature_bytes(&self) -> &[u8] {
        if self.signature.is_null() || self.signature_len == 0 {
            return &[];
        }
        // SAFETY: guaranteed by the caller
        unsafe { std::slice::from_raw_parts(self.signature, self.signature_len) }
    }

    /// Address of the function, for null checks.
    pub fn address(&self) -> *const () {
        // SAFETY: every field is pointer-sized and pointer-aligned
        unsafe { self.func.raw }
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: Debug is only reachable on records that are alive
        let signature = unsafe { self.signature_bytes() };
        f.debug_struct("EntryPoint")
            .field("abi_version", &self.abi_version)
            .field("signature", &String::from_utf8_lossy(signature))
            .field("address", &self.address())
            .finish()
    }
}
