//! # Share Payload Codec
//!
//! ```text
//! current  "c1:" + base64url(deflate(JCS(bundle), level 9))
//! legacy   base64url(JSON(bundle))
//! ```
//!
//! Decoding checks the encoded length before doing any work, then inflates
//! through a reader capped one byte past the output ceiling, so a
//! decompression bomb costs at most `max_inflated + 1` bytes of memory.
//! Malformed input of any kind is an error, never a panic.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::Value;
use sigil_core::{b64url_decode, b64url_encode, CanonicalBytes};

use crate::error::ShareError;

/// Version prefix of compressed payloads.
pub const COMPRESSED_PREFIX: &str = "c1:";

/// Default ceiling on the encoded payload length, in bytes.
pub const DEFAULT_MAX_ENCODED_BYTES: usize = 32 * 1024;

/// Default ceiling on the decoded JSON length, in bytes.
pub const DEFAULT_MAX_INFLATED_BYTES: usize = 256 * 1024;

const DEFLATE_LEVEL: u32 = 9;

/// Which wire form a payload used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareFormat {
    Compressed,
    Legacy,
}

/// A decoded share payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharePayload {
    pub format: ShareFormat,
    pub bundle: Value,
}

/// Byte ceilings applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareLimits {
    pub max_encoded: usize,
    pub max_inflated: usize,
}

impl Default for ShareLimits {
    fn default() -> Self {
        Self {
            max_encoded: DEFAULT_MAX_ENCODED_BYTES,
            max_inflated: DEFAULT_MAX_INFLATED_BYTES,
        }
    }
}

/// Encoder/decoder for share payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShareCodec {
    limits: ShareLimits,
}

impl ShareCodec {
    pub fn new(limits: ShareLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ShareLimits {
        self.limits
    }

    /// Encode a bundle in the current compressed form.
    ///
    /// Fails if the result would be refused by [`decode`](Self::decode)
    /// with the same limits.
    pub fn encode(&self, bundle: &impl Serialize) -> Result<String, ShareError> {
        let canonical =
            CanonicalBytes::new(bundle).map_err(|e| ShareError::Encode(e.to_string()))?;
        self.check_inflated(canonical.len())?;

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(DEFLATE_LEVEL));
        encoder
            .write_all(canonical.as_bytes())
            .map_err(|e| ShareError::Encode(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| ShareError::Encode(e.to_string()))?;

        let payload = format!("{COMPRESSED_PREFIX}{}", b64url_encode(compressed));
        self.check_encoded(payload.len())?;
        Ok(payload)
    }

    /// Encode a bundle in the legacy uncompressed form.
    pub fn encode_legacy(&self, bundle: &impl Serialize) -> Result<String, ShareError> {
        let json = serde_json::to_vec(bundle).map_err(|e| ShareError::Encode(e.to_string()))?;
        self.check_inflated(json.len())?;
        let payload = b64url_encode(json);
        self.check_encoded(payload.len())?;
        Ok(payload)
    }

    /// Decode a payload in either form.
    ///
    /// A payload with a `prefix:` is treated as versioned; base64url never
    /// contains `:`, so anything without one is legacy.
    pub fn decode(&self, payload: &str) -> Result<SharePayload, ShareError> {
        let payload = payload.trim();
        self.check_encoded(payload.len())?;
        if let Some(body) = payload.strip_prefix(COMPRESSED_PREFIX) {
            return self.decode_compressed_body(body);
        }
        if let Some((version, _)) = payload.split_once(':') {
            return Err(ShareError::UnknownVersion(version.to_string()));
        }
        self.decode_legacy(payload)
    }

    /// Decode a legacy uncompressed payload.
    pub fn decode_legacy(&self, payload: &str) -> Result<SharePayload, ShareError> {
        let payload = payload.trim();
        self.check_encoded(payload.len())?;
        let json = b64url_decode(payload).map_err(|e| ShareError::Decode(e.to_string()))?;
        self.check_inflated(json.len())?;
        Ok(SharePayload {
            format: ShareFormat::Legacy,
            bundle: parse_json(&json)?,
        })
    }

    fn decode_compressed_body(&self, body: &str) -> Result<SharePayload, ShareError> {
        let compressed = b64url_decode(body).map_err(|e| ShareError::Decode(e.to_string()))?;

        let limit = self.limits.max_inflated;
        let mut inflated = Vec::new();
        DeflateDecoder::new(compressed.as_slice())
            .take(limit as u64 + 1)
            .read_to_end(&mut inflated)
            .map_err(|e| ShareError::Decode(format!("inflate: {e}")))?;
        if inflated.len() > limit {
            tracing::debug!(limit, "share payload inflation aborted at ceiling");
            return Err(ShareError::SizeLimit {
                what: "inflated payload",
                actual: inflated.len(),
                limit,
            });
        }

        Ok(SharePayload {
            format: ShareFormat::Compressed,
            bundle: parse_json(&inflated)?,
        })
    }

    fn check_encoded(&self, len: usize) -> Result<(), ShareError> {
        if len > self.limits.max_encoded {
            return Err(ShareError::SizeLimit {
                what: "encoded payload",
                actual: len,
                limit: self.limits.max_encoded,
            });
        }
        Ok(())
    }

    fn check_inflated(&self, len: usize) -> Result<(), ShareError> {
        if len > self.limits.max_inflated {
            return Err(ShareError::SizeLimit {
                what: "inflated payload",
                actual: len,
                limit: self.limits.max_inflated,
            });
        }
        Ok(())
    }
}

fn parse_json(bytes: &[u8]) -> Result<Value, ShareError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ShareError::Decode(format!("utf-8: {e}")))?;
    serde_json::from_str(text).map_err(|e| ShareError::Decode(format!("json: {e}")))
}

/// Encode with default limits.
pub fn encode(bundle: &impl Serialize) -> Result<String, ShareError> {
    ShareCodec::default().encode(bundle)
}

/// Decode with default limits.
pub fn decode(payload: &str) -> Result<SharePayload, ShareError> {
    ShareCodec::default().decode(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deflate(bytes: &[u8]) -> Vec<u8> {
        let mut e = DeflateEncoder::new(Vec::new(), Compression::new(9));
        e.write_all(bytes).unwrap();
        e.finish().unwrap()
    }

    #[test]
    fn round_trip_is_canonical() {
        let value = json!({"b": [1, 2, {"z": "x", "a": null}], "a": "é"});
        let payload = encode(&value).unwrap();
        assert!(payload.starts_with(COMPRESSED_PREFIX));
        let decoded = decode(&payload).unwrap();
        assert_eq!(decoded.format, ShareFormat::Compressed);
        assert_eq!(decoded.bundle, value);
        // Key order does not change the payload.
        let reordered = json!({"a": "é", "b": [1, 2, {"a": null, "z": "x"}]});
        assert_eq!(encode(&reordered).unwrap(), payload);
    }

    #[test]
    fn legacy_round_trip() {
        let value = json!({"receipt": {"bundleHash": "ab"}});
        let codec = ShareCodec::default();
        let payload = codec.encode_legacy(&value).unwrap();
        assert!(!payload.contains(':'));
        let decoded = codec.decode(&payload).unwrap();
        assert_eq!(decoded.format, ShareFormat::Legacy);
        assert_eq!(decoded.bundle, value);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = decode("c2:AAAA").unwrap_err();
        assert_eq!(err, ShareError::UnknownVersion("c2".into()));
    }

    #[test]
    fn oversized_encoding_is_rejected_before_inflating() {
        let codec = ShareCodec::new(ShareLimits {
            max_encoded: 16,
            max_inflated: 1024,
        });
        let err = codec.decode(&format!("c1:{}", "A".repeat(64))).unwrap_err();
        assert!(matches!(err, ShareError::SizeLimit { what: "encoded payload", .. }));
    }

    #[test]
    fn decompression_bomb_stops_at_ceiling() {
        let bomb = deflate(&vec![b' '; 2 * 1024 * 1024]);
        let payload = format!("c1:{}", b64url_encode(bomb));
        let err = decode(&payload).unwrap_err();
        match err {
            ShareError::SizeLimit { what, actual, limit } => {
                assert_eq!(what, "inflated payload");
                assert_eq!(limit, DEFAULT_MAX_INFLATED_BYTES);
                assert_eq!(actual, limit + 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_payloads_are_errors() {
        let bad_b64 = decode("c1:@@@").unwrap_err();
        assert!(matches!(bad_b64, ShareError::Decode(_)));

        let bad_deflate = decode(&format!("c1:{}", b64url_encode([0xff, 0xff, 0xff]))).unwrap_err();
        assert!(matches!(bad_deflate, ShareError::Decode(_)));

        let bad_utf8 = decode(&format!("c1:{}", b64url_encode(deflate(&[0xc3, 0x28])))).unwrap_err();
        assert!(matches!(bad_utf8, ShareError::Decode(msg) if msg.contains("utf-8")));

        let bad_json = decode(&format!("c1:{}", b64url_encode(deflate(b"{\"a\":")))).unwrap_err();
        assert!(matches!(bad_json, ShareError::Decode(msg) if msg.contains("json")));

        assert!(decode("").is_err());
    }

    #[test]
    fn encode_refuses_what_decode_would_refuse() {
        let codec = ShareCodec::new(ShareLimits {
            max_encoded: 1024,
            max_inflated: 8,
        });
        let err = codec.encode(&json!({"long": "value"})).unwrap_err();
        assert!(matches!(err, ShareError::SizeLimit { .. }));
    }

    #[test]
    fn non_integral_numbers_round_trip() {
        let value = json!({"valuation": {"phi": 1.618, "weights": [0.25, -3.5, 1e-7]}});
        let payload = encode(&value).unwrap();
        assert_eq!(decode(&payload).unwrap().bundle, value);
    }

    proptest::proptest! {
        #[test]
        fn decode_never_panics(s in "\\PC{0,200}") {
            let _ = decode(&s);
            let _ = decode(&format!("c1:{s}"));
        }

        #[test]
        fn round_trips_jcs_safe_values(
            keys in proptest::collection::vec("[a-z]{1,8}", 0..8),
            n in proptest::prelude::any::<i64>(),
            s in "\\PC{0,40}",
        ) {
            let mut map = serde_json::Map::new();
            for k in &keys {
                map.insert(k.clone(), json!([n, s.clone(), {"nested": k}]));
            }
            let value = Value::Object(map);
            let payload = encode(&value).unwrap();
            proptest::prop_assert_eq!(decode(&payload).unwrap().bundle, value);
        }
    }
}
