//! # Proof Capsule
//!
//! The capsule is the claimed moment-binding of a sigil: which pulse it was
//! minted at, its signature over that moment, and the phi key of the minter.
//! It is hashed as part of the canonical bundle, so every field here is part
//! of the tamper-evident surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigil_core::{sha256_digest, CanonicalBytes, ContentDigest, Pulse, SigilError};

/// Field names that must be present (and non-null) in a capsule JSON object.
pub const REQUIRED_CAPSULE_FIELDS: [&str; 6] = [
    "version",
    "pulse",
    "chakraDay",
    "kaiSignature",
    "phiKey",
    "verifierSlug",
];

/// The moment-binding claim embedded in every bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofCapsule {
    /// Capsule schema version, e.g. `"KPV-1"`.
    pub version: String,
    /// Pulse the sigil was minted at.
    pub pulse: Pulse,
    /// Day label from the external calendar.
    pub chakra_day: String,
    /// Signature over the moment, produced by the clock collaborator.
    pub kai_signature: String,
    /// Identifier of the minting key.
    pub phi_key: String,
    /// Slug the verifier page is addressed by.
    pub verifier_slug: String,
}

impl ProofCapsule {
    /// Construct and validate a capsule.
    pub fn new(
        version: impl Into<String>,
        pulse: Pulse,
        chakra_day: impl Into<String>,
        kai_signature: impl Into<String>,
        phi_key: impl Into<String>,
        verifier_slug: impl Into<String>,
    ) -> Result<Self, SigilError> {
        let capsule = Self {
            version: version.into(),
            pulse,
            chakra_day: chakra_day.into(),
            kai_signature: kai_signature.into(),
            phi_key: phi_key.into(),
            verifier_slug: verifier_slug.into(),
        };
        capsule.validate()?;
        Ok(capsule)
    }

    /// Decode a capsule from untyped JSON.
    ///
    /// Reports the first missing required field by name before attempting
    /// typed deserialization, so a caller sees `missing field phiKey`
    /// rather than a serde position error.
    pub fn from_json(value: &Value) -> Result<Self, SigilError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SigilError::Input("proof capsule must be a JSON object".into()))?;
        for field in REQUIRED_CAPSULE_FIELDS {
            match obj.get(field) {
                None | Some(Value::Null) => {
                    return Err(SigilError::Input(format!(
                        "proof capsule missing required field {field}"
                    )))
                }
                Some(_) => {}
            }
        }
        let capsule: Self = serde_json::from_value(value.clone())
            .map_err(|e| SigilError::Input(format!("malformed proof capsule: {e}")))?;
        capsule.validate()?;
        Ok(capsule)
    }

    /// Check that every string field is non-empty.
    pub fn validate(&self) -> Result<(), SigilError> {
        let fields = [
            ("version", &self.version),
            ("chakraDay", &self.chakra_day),
            ("kaiSignature", &self.kai_signature),
            ("phiKey", &self.phi_key),
            ("verifierSlug", &self.verifier_slug),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(SigilError::Input(format!(
                    "proof capsule field {name} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// `SHA256(JCS(capsule))`.
    pub fn hash(&self) -> Result<ContentDigest, SigilError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capsule_json() -> Value {
        serde_json::json!({
            "version": "KPV-1",
            "pulse": 1_000_001,
            "chakraDay": "Root",
            "kaiSignature": "f00d",
            "phiKey": "phi1",
            "verifierSlug": "1000001-f00d"
        })
    }

    #[test]
    fn decodes_valid_capsule() {
        let capsule = ProofCapsule::from_json(&capsule_json()).unwrap();
        assert_eq!(capsule.pulse, Pulse(1_000_001));
        assert_eq!(capsule.phi_key, "phi1");
    }

    #[test]
    fn each_missing_field_is_named() {
        for field in REQUIRED_CAPSULE_FIELDS {
            let mut v = capsule_json();
            v.as_object_mut().unwrap().remove(field);
            let err = ProofCapsule::from_json(&v).unwrap_err();
            assert!(
                matches!(&err, SigilError::Input(msg) if msg.contains(field)),
                "field {field}: {err}"
            );
        }
    }

    #[test]
    fn null_field_counts_as_missing() {
        let mut v = capsule_json();
        v["kaiSignature"] = Value::Null;
        assert!(ProofCapsule::from_json(&v).is_err());
    }

    #[test]
    fn empty_string_rejected() {
        let err = ProofCapsule::new("KPV-1", Pulse(1), "Root", "", "phi", "slug").unwrap_err();
        assert!(matches!(err, SigilError::Input(_)));
    }

    #[test]
    fn non_object_rejected() {
        assert!(ProofCapsule::from_json(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn hash_is_stable_across_key_order() {
        let a = ProofCapsule::from_json(&capsule_json()).unwrap();
        let reordered: Value = serde_json::from_str(
            r#"{"verifierSlug":"1000001-f00d","phiKey":"phi1","kaiSignature":"f00d","chakraDay":"Root","pulse":1000001,"version":"KPV-1"}"#,
        )
        .unwrap();
        let b = ProofCapsule::from_json(&reordered).unwrap();
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
    }
}
