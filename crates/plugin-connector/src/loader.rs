//! Module loader.
//!
//! Opens a connector module from a shared library file. Opening a library
//! runs its static initializers, which the host cannot sandbox: module paths
//! are trusted input.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use plugin_connector_sdk::EntryPoint;
use sha2::{Digest, Sha256};

use crate::error::OpenError;

/// Source of entry point records, looked up by symbol name.
pub trait ModuleSymbols {
    /// Look up the entry point exported under `symbol`.
    fn entry_point(&self, symbol: &str) -> Option<&'static EntryPoint>;

    /// Human-readable name of the module, for diagnostics.
    fn describe(&self) -> String;
}

/// Handle to an opened shared library.
///
/// The library is never unloaded: function pointers resolved from it are
/// held for the rest of the process.
#[derive(Debug)]
pub struct ModuleHandle {
    path: PathBuf,
    library: &'static Library,
    loaded_at: chrono::DateTime<chrono::Utc>,
}

impl ModuleHandle {
    /// Open the module at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        Self::open_verified(path, None)
    }

    /// Open the module at `path`, checking its SHA-256 first when a digest is
    /// given.
    pub fn open_verified(
        path: impl AsRef<Path>,
        expected_sha256: Option<&str>,
    ) -> Result<Self, OpenError> {
        let path = path.as_ref();

        validate_path(path)?;

        if let Some(expected) = expected_sha256 {
            verify_checksum(path, expected)?;
        }

        // SAFETY: loading runs the module's initializers; module paths are
        // trusted configuration.
        let library = unsafe { Library::new(path) }.map_err(|e| OpenError::load(path, e))?;
        let library: &'static Library = Box::leak(Box::new(library));

        tracing::debug!(path = %path.display(), "Loaded connector module");

        Ok(Self {
            path: path.to_path_buf(),
            library,
            loaded_at: chrono::Utc::now(),
        })
    }

    /// Path the module was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the module was opened.
    pub fn loaded_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.loaded_at
    }
}

impl ModuleSymbols for ModuleHandle {
    fn entry_point(&self, symbol: &str) -> Option<&'static EntryPoint> {
        // SAFETY: entry points are exported as `EntryPoint` statics, so the
        // symbol address is the address of the record. Whether the record
        // itself is sound is checked before any call is made through it.
        let found: Result<Symbol<'static, *const EntryPoint>, _> =
            unsafe { self.library.get(symbol.as_bytes()) };

        match found {
            Ok(found) => {
                let record: *const EntryPoint = *found;
                // SAFETY: the library is never unloaded
                unsafe { record.as_ref() }
            }
            Err(e) => {
                tracing::debug!(symbol, error = %e, "Symbol lookup failed");
                None
            }
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Entry points registered in-process.
///
/// Lets a connector linked into the host binary go through the same
/// resolution and verification as one loaded from disk.
#[derive(Debug, Default, Clone)]
pub struct StaticModule {
    name: String,
    entries: HashMap<String, &'static EntryPoint>,
}

impl StaticModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Register `entry` under `symbol`.
    pub fn with_entry_point(mut self, symbol: impl Into<String>, entry: &'static EntryPoint) -> Self {
        self.entries.insert(symbol.into(), entry);
        self
    }

    /// Exported symbol names, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

impl ModuleSymbols for StaticModule {
    fn entry_point(&self, symbol: &str) -> Option<&'static EntryPoint> {
        self.entries.get(symbol).copied()
    }

    fn describe(&self) -> String {
        format!("static:{}", self.name)
    }
}

fn validate_path(path: &Path) -> Result<(), OpenError> {
    if !path.exists() {
        return Err(OpenError::load(path, "no such file"));
    }
    if !path.is_file() {
        return Err(OpenError::load(path, "not a regular file"));
    }
    Ok(())
}

fn verify_checksum(path: &Path, expected: &str) -> Result<(), OpenError> {
    let data = std::fs::read(path).map_err(|e| OpenError::load(path, e))?;
    let actual = compute_sha256(&data);
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(OpenError::load(
            path,
            format!("checksum mismatch: expected {}, found {}", expected, actual),
        ));
    }
    Ok(())
}

/// Compute SHA256 checksum of file content
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
