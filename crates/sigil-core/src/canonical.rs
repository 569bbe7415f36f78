//! # Canonical Serialization: JCS Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in digest computation across the Sigil stack: bundle hashes, capsule
//! hashes, receipt hashes, challenge material, and share payloads.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which serializes with
//! `serde_jcs` (RFC 8785): sorted keys, compact separators, one byte
//! sequence per logical value.
//!
//! Any function requiring canonical bytes for digest computation accepts
//! `&CanonicalBytes`, so hashing a non-canonical serialization of a bundle
//! is a compile error rather than a silent interop break with the browser
//! implementation that produced the share link.
//!
//! ## Numbers
//!
//! Non-integral numbers are rendered the way ECMAScript
//! `Number.prototype.toString` renders them (`1.618`, `1e+21`), which is
//! what a browser's JCS produces for the same value. An integral float such
//! as `2.0` is rendered `2`. Non-finite values cannot occur: `serde_json`
//! maps them to `null` before canonicalization.

use serde::Serialize;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Numbers use the ECMAScript shortest round-trip form.
/// - Object keys are sorted, separators are compact (RFC 8785).
/// - The bytes are valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value
    /// cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View the canonical bytes as a JSON string.
    ///
    /// Infallible in practice: JCS output is always UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Consume into the owned byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,40}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z]{1,10}", inner, 0..8)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonical_bytes_deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn canonical_bytes_reparse_to_same_value(value in json_value_no_floats()) {
            let cb = CanonicalBytes::new(&value).unwrap();
            let parsed: Value = serde_json::from_slice(cb.as_bytes()).unwrap();
            prop_assert_eq!(parsed, value);
        }

        #[test]
        fn canonicalization_is_idempotent(value in json_value_no_floats()) {
            let once = CanonicalBytes::new(&value).unwrap();
            let reparsed: Value = serde_json::from_slice(once.as_bytes()).unwrap();
            let twice = CanonicalBytes::new(&reparsed).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
