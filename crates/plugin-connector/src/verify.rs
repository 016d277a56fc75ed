//! Entry point verification.
//!
//! Symbols are resolved by name only, so nothing but the record exported
//! next to each function tells the host what the function looks like. An
//! entry point is accepted when its ABI version and every parameter and the
//! return type of its signature match exactly.

use plugin_connector_sdk::descriptor::split_signature;
use plugin_connector_sdk::{EntryPoint, Signature, ENTRY_POINT_ABI_VERSION};

use crate::error::{Mismatch, OpenError};
use crate::loader::ModuleSymbols;

/// Look up and verify one entry point.
///
/// An absent required symbol is an error; an absent optional one is `None`.
/// A present symbol with the wrong shape is an error either way.
pub(crate) fn resolve(
    module: &dyn ModuleSymbols,
    expected: &Signature,
) -> Result<Option<&'static EntryPoint>, OpenError> {
    let Some(entry) = module.entry_point(expected.symbol) else {
        if expected.required {
            return Err(OpenError::MissingSymbol(expected.symbol));
        }
        tracing::debug!(symbol = expected.symbol, "Optional symbol not exported");
        return Ok(None);
    };

    verify(entry, expected).map_err(|mismatch| OpenError::SignatureMismatch {
        symbol: expected.symbol,
        mismatch,
    })?;

    tracing::debug!(symbol = expected.symbol, "Resolved entry point");
    Ok(Some(entry))
}

/// Check an entry point record against the expected signature.
pub fn verify(entry: &EntryPoint, expected: &Signature) -> Result<(), Mismatch> {
    if entry.abi_version() != ENTRY_POINT_ABI_VERSION {
        return Err(Mismatch::AbiVersion {
            expected: ENTRY_POINT_ABI_VERSION,
            found: entry.abi_version(),
        });
    }

    if entry.address().is_null() {
        return Err(Mismatch::NullFunction);
    }

    // SAFETY: records come from 'static module data that is never unloaded
    let raw = unsafe { entry.signature_bytes() };
    let found = std::str::from_utf8(raw)
        .map_err(|_| Mismatch::MalformedSignature(String::from_utf8_lossy(raw).into_owned()))?;

    compare(expected.text, found)
}

fn compare(expected: &str, found: &str) -> Result<(), Mismatch> {
    let (expected_params, expected_returns) = split_signature(expected)
        .ok_or_else(|| Mismatch::MalformedSignature(expected.to_string()))?;
    let (found_params, found_returns) =
        split_signature(found).ok_or_else(|| Mismatch::MalformedSignature(found.to_string()))?;

    if expected_params.len() != found_params.len() {
        return Err(Mismatch::ParamCount {
            expected: expected_params.len(),
            found: found_params.len(),
        });
    }

    if let Some((position, (want, got))) = expected_params
        .iter()
        .zip(found_params.iter())
        .enumerate()
        .find(|(_, (want, got))| want != got)
    {
        return Err(Mismatch::Param {
            position: position + 1,
            expected: want.to_string(),
            found: got.to_string(),
        });
    }

    if expected_returns != found_returns {
        return Err(Mismatch::Return {
            expected: expected_returns.to_string(),
            found: found_returns.to_string(),
        });
    }

    Ok(())
}
