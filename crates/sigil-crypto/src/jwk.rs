//! # P-256 Public Key JWK
//!
//! WebAuthn credentials hand out their public key as an EC JWK. Only
//! `kty`, `crv`, `x` and `y` carry meaning; other members (`alg`, `ext`,
//! `key_ops`) are accepted and ignored so that keys exported by different
//! browsers normalize to the same value.

use p256::ecdsa::VerifyingKey;
use p256::{EncodedPoint, FieldBytes};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sigil_core::b64url_decode;

use crate::error::KasError;

/// An EC public key in JWK form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
}

impl PublicKeyJwk {
    /// Build the JWK for a P-256 verifying key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let coord = |c: Option<&FieldBytes>| c.map(sigil_core::b64url_encode).unwrap_or_default();
        Self {
            kty: "EC".into(),
            crv: "P-256".into(),
            x: coord(point.x()),
            y: coord(point.y()),
        }
    }

    /// Parse from untyped JSON, ignoring unknown members.
    pub fn from_json(value: &Value) -> Result<Self, KasError> {
        serde_json::from_value(value.clone())
            .map_err(|e| KasError::Key(format!("malformed JWK: {e}")))
    }

    /// The members that identify the key, in a fixed shape.
    pub fn normalized(&self) -> Value {
        json!({
            "crv": self.crv,
            "kty": self.kty,
            "x": self.x,
            "y": self.y,
        })
    }

    /// Decode into a verifying key, rejecting anything but an on-curve
    /// uncompressed P-256 point.
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, KasError> {
        if self.kty != "EC" || self.crv != "P-256" {
            return Err(KasError::Key(format!(
                "unsupported key type {}/{}",
                self.kty, self.crv
            )));
        }
        let x = coordinate(&self.x, "x")?;
        let y = coordinate(&self.y, "y")?;
        let point = EncodedPoint::from_affine_coordinates(&x, &y, false);
        VerifyingKey::from_encoded_point(&point)
            .map_err(|_| KasError::Key("point is not on P-256".into()))
    }
}

fn coordinate(s: &str, name: &str) -> Result<FieldBytes, KasError> {
    let bytes = b64url_decode(s).map_err(|e| KasError::Key(format!("{name}: {e}")))?;
    if bytes.len() != 32 {
        return Err(KasError::Key(format!(
            "{name} must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(*FieldBytes::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::SigningKey;

    fn key() -> VerifyingKey {
        *SigningKey::from_slice(&[3u8; 32]).unwrap().verifying_key()
    }

    #[test]
    fn round_trips_through_jwk() {
        let jwk = PublicKeyJwk::from_verifying_key(&key());
        assert_eq!(jwk.to_verifying_key().unwrap(), key());
    }

    #[test]
    fn extra_members_are_ignored() {
        let mut value = serde_json::to_value(PublicKeyJwk::from_verifying_key(&key())).unwrap();
        value["alg"] = json!("ES256");
        value["ext"] = json!(true);
        let jwk = PublicKeyJwk::from_json(&value).unwrap();
        assert_eq!(jwk.normalized(), PublicKeyJwk::from_verifying_key(&key()).normalized());
    }

    #[test]
    fn rejects_wrong_curve_and_bad_points() {
        let mut jwk = PublicKeyJwk::from_verifying_key(&key());
        jwk.crv = "P-384".into();
        assert!(jwk.to_verifying_key().is_err());

        let mut jwk = PublicKeyJwk::from_verifying_key(&key());
        jwk.y = jwk.x.clone();
        assert!(jwk.to_verifying_key().is_err());

        let mut jwk = PublicKeyJwk::from_verifying_key(&key());
        jwk.x = "AAAA".into();
        assert!(jwk.to_verifying_key().is_err());
    }
}
