//! # Wire Encodings
//!
//! base64url is the encoding WebAuthn uses for every binary field and the
//! encoding share links use for payloads. Output is always unpadded;
//! input tolerates padding because some browsers emit it.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::SigilError;

/// Encode bytes as unpadded base64url.
pub fn b64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode base64url, accepting both padded and unpadded input.
pub fn b64url_decode(s: &str) -> Result<Vec<u8>, SigilError> {
    let s = s.trim();
    let result = if s.ends_with('=') {
        URL_SAFE.decode(s)
    } else {
        URL_SAFE_NO_PAD.decode(s)
    };
    result.map_err(|e| SigilError::Decode(format!("invalid base64url: {e}")))
}

/// Decode a hex string of any even length.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, SigilError> {
    hex::decode(s.trim()).map_err(|e| SigilError::Input(format!("invalid hex: {e}")))
}
