//! # Canonical Bundle
//!
//! Assembles a sigil's proof material (SVG bytes, capsule, ZK proof and
//! public inputs) into one deterministic object and derives its hash chain:
//!
//! ```text
//! svgHash     = SHA256(svgBytes)
//! capsuleHash = SHA256(JCS(proofCapsule))
//! bundleHash  = SHA256(JCS(canonicalBundleObject))
//! ```
//!
//! The canonical bundle object holds the capsule, both hashes and the ZK
//! artifacts. The serialized proof bundle is that object plus `bundleHash`.
//!
//! ## Security Invariant
//!
//! A `CanonicalBundle` is immutable: fields are private, there is no `&mut`
//! API, and every serialized form is computed once in [`CanonicalBundleBuilder::build`].
//! Consumers may cache by `bundle_hash()` without staleness risk.

use serde_json::{Map, Value};
use sigil_core::{sha256_bytes, sha256_digest, CanonicalBytes, ContentDigest, SigilError};

use crate::capsule::ProofCapsule;

/// Version tag of the canonical bundle object.
pub const BUNDLE_VERSION: &str = "KPB-1";
/// Version tag of the manifest object.
pub const MANIFEST_VERSION: &str = "KPM-1";

/// File name of the SVG artifact inside a manifest.
pub const SVG_FILE_NAME: &str = "sigil.svg";
/// File name of the PNG artifact inside a manifest.
pub const PNG_FILE_NAME: &str = "sigil.png";
/// File name of the proof bundle inside a manifest.
pub const PROOF_BUNDLE_FILE_NAME: &str = "proof_bundle.json";

/// The immutable canonical form of a sigil's proof material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBundle {
    svg_bytes: Vec<u8>,
    proof_capsule: ProofCapsule,
    zk_poseidon_hash: String,
    zk_proof: Value,
    zk_public_inputs: Vec<String>,
    svg_hash: ContentDigest,
    capsule_hash: ContentDigest,
    bundle_hash: ContentDigest,
    canonical_bundle_object: Value,
    proof_bundle: Value,
    proof_bundle_json: String,
    manifest_json: String,
}

impl CanonicalBundle {
    /// The SVG exactly as hashed into `svgHash`.
    pub fn svg_bytes(&self) -> &[u8] {
        &self.svg_bytes
    }

    /// The validated proof capsule.
    pub fn proof_capsule(&self) -> &ProofCapsule {
        &self.proof_capsule
    }

    /// The canonical decimal commitment.
    pub fn zk_poseidon_hash(&self) -> &str {
        &self.zk_poseidon_hash
    }

    /// The proof in its wire (snarkjs) form.
    pub fn zk_proof(&self) -> &Value {
        &self.zk_proof
    }

    /// Public signals; the first equals [`Self::zk_poseidon_hash`].
    pub fn zk_public_inputs(&self) -> &[String] {
        &self.zk_public_inputs
    }

    /// `SHA256(svgBytes)`.
    pub fn svg_hash(&self) -> ContentDigest {
        self.svg_hash
    }

    /// `SHA256(JCS(proofCapsule))`.
    pub fn capsule_hash(&self) -> ContentDigest {
        self.capsule_hash
    }

    /// `SHA256(JCS(canonicalBundleObject))`, the hash attestations and receipts bind to.
    pub fn bundle_hash(&self) -> ContentDigest {
        self.bundle_hash
    }

    /// The object `bundleHash` is computed over.
    pub fn canonical_bundle_object(&self) -> &Value {
        &self.canonical_bundle_object
    }

    /// The canonical bundle object plus its `bundleHash`.
    pub fn proof_bundle(&self) -> &Value {
        &self.proof_bundle
    }

    /// JCS serialization of [`Self::proof_bundle`].
    pub fn proof_bundle_json(&self) -> &str {
        &self.proof_bundle_json
    }

    /// JCS serialization of the file manifest (`sigil.svg`, optional
    /// `sigil.png`, `proof_bundle.json` with their sizes and digests).
    pub fn manifest_json(&self) -> &str {
        &self.manifest_json
    }
}

/// Builder for [`CanonicalBundle`].
///
/// ```ignore
/// let bundle = CanonicalBundleBuilder::new(svg_text, capsule)
///     .png_bytes(&png)
///     .zk(poseidon_hash, proof_json, public_inputs)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct CanonicalBundleBuilder<'a> {
    svg_text: &'a str,
    png_bytes: Option<&'a [u8]>,
    capsule: &'a ProofCapsule,
    zk_poseidon_hash: String,
    zk_proof: Value,
    zk_public_inputs: Vec<String>,
}

impl<'a> CanonicalBundleBuilder<'a> {
    pub fn new(svg_text: &'a str, capsule: &'a ProofCapsule) -> Self {
        Self {
            svg_text,
            png_bytes: None,
            capsule,
            zk_poseidon_hash: String::new(),
            zk_proof: Value::Null,
            zk_public_inputs: Vec::new(),
        }
    }

    /// Include a rasterized PNG in the manifest.
    pub fn png_bytes(mut self, png: &'a [u8]) -> Self {
        self.png_bytes = Some(png);
        self
    }

    /// Attach the ZK commitment, proof and public signals.
    pub fn zk(
        mut self,
        zk_poseidon_hash: impl Into<String>,
        zk_proof: Value,
        zk_public_inputs: Vec<String>,
    ) -> Self {
        self.zk_poseidon_hash = zk_poseidon_hash.into();
        self.zk_proof = zk_proof;
        self.zk_public_inputs = zk_public_inputs;
        self
    }

    /// Derive the hash chain and serialized forms.
    ///
    /// # Errors
    ///
    /// - `Input` if the capsule is invalid or the commitment is empty.
    /// - `CryptoMismatch` if the first public input is not the commitment.
    /// - `Canonicalization` if the ZK proof cannot be serialized.
    pub fn build(self) -> Result<CanonicalBundle, SigilError> {
        self.capsule.validate()?;
        let zk_poseidon_hash = self.zk_poseidon_hash.trim().to_string();
        if zk_poseidon_hash.is_empty() {
            return Err(SigilError::Input("zkPoseidonHash is required".into()));
        }
        if let Some(first) = self.zk_public_inputs.first() {
            if first != &zk_poseidon_hash {
                return Err(SigilError::CryptoMismatch("ZK public input mismatch".into()));
            }
        }

        let svg_bytes = self.svg_text.as_bytes().to_vec();
        let svg_hash = sha256_bytes(&svg_bytes);
        let capsule_hash = self.capsule.hash()?;

        let mut object = Map::new();
        object.insert("v".into(), Value::from(BUNDLE_VERSION));
        object.insert("hashAlg".into(), Value::from("sha256"));
        object.insert("canon".into(), Value::from("JCS"));
        object.insert("proofCapsule".into(), serde_json::to_value(self.capsule).map_err(json_err)?);
        object.insert("capsuleHash".into(), Value::from(capsule_hash.to_hex()));
        object.insert("svgHash".into(), Value::from(svg_hash.to_hex()));
        object.insert("zkPoseidonHash".into(), Value::from(zk_poseidon_hash.clone()));
        object.insert("zkProof".into(), self.zk_proof.clone());
        object.insert(
            "zkPublicInputs".into(),
            Value::from(self.zk_public_inputs.clone()),
        );
        let canonical_bundle_object = Value::Object(object.clone());
        let bundle_hash = sha256_digest(&CanonicalBytes::new(&canonical_bundle_object)?);

        object.insert("bundleHash".into(), Value::from(bundle_hash.to_hex()));
        let proof_bundle = Value::Object(object);
        let proof_bundle_bytes = CanonicalBytes::new(&proof_bundle)?;
        let proof_bundle_hash = sha256_digest(&proof_bundle_bytes);
        let proof_bundle_len = proof_bundle_bytes.len();
        let proof_bundle_json = proof_bundle_bytes.as_str().to_string();

        let mut files = vec![manifest_file(SVG_FILE_NAME, svg_bytes.len(), svg_hash)];
        if let Some(png) = self.png_bytes {
            files.push(manifest_file(PNG_FILE_NAME, png.len(), sha256_bytes(png)));
        }
        files.push(manifest_file(
            PROOF_BUNDLE_FILE_NAME,
            proof_bundle_len,
            proof_bundle_hash,
        ));
        let manifest = serde_json::json!({
            "v": MANIFEST_VERSION,
            "bundleHash": bundle_hash.to_hex(),
            "pulse": self.capsule.pulse,
            "files": files,
        });
        let manifest_json = CanonicalBytes::new(&manifest)?.as_str().to_string();

        tracing::debug!(
            bundle_hash = %bundle_hash,
            pulse = %self.capsule.pulse,
            "built canonical bundle"
        );

        Ok(CanonicalBundle {
            svg_bytes,
            proof_capsule: self.capsule.clone(),
            zk_poseidon_hash,
            zk_proof: self.zk_proof,
            zk_public_inputs: self.zk_public_inputs,
            svg_hash,
            capsule_hash,
            bundle_hash,
            canonical_bundle_object,
            proof_bundle,
            proof_bundle_json,
            manifest_json,
        })
    }
}

/// Build a canonical bundle in one call.
pub fn build_bundle(
    svg_text: &str,
    png_bytes: Option<&[u8]>,
    capsule: &ProofCapsule,
    zk_poseidon_hash: &str,
    zk_proof: Value,
    zk_public_inputs: Vec<String>,
) -> Result<CanonicalBundle, SigilError> {
    let mut builder = CanonicalBundleBuilder::new(svg_text, capsule).zk(
        zk_poseidon_hash,
        zk_proof,
        zk_public_inputs,
    );
    if let Some(png) = png_bytes {
        builder = builder.png_bytes(png);
    }
    builder.build()
}

/// Whether `value` has the shape of a proof bundle: an object carrying
/// `bundleHash` together with the capsule or SVG hash chain.
///
/// Receipts and other shared records also carry `bundleHash` but refer to
/// a bundle rather than being one; they fail this check.
pub fn is_proof_bundle(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.contains_key("bundleHash")
            && ["proofCapsule", "capsuleHash", "svgHash"]
                .iter()
                .any(|k| obj.contains_key(*k))
    })
}

/// Recompute the hash chain of a received proof bundle.
///
/// Strips `bundleHash`, re-canonicalizes, and compares against the claimed
/// value. Also re-derives `capsuleHash` from the embedded capsule. When the
/// SVG bytes are supplied, `svgHash` is checked too. Returns the verified
/// bundle hash.
pub fn verify_proof_bundle(
    proof_bundle: &Value,
    svg_bytes: Option<&[u8]>,
) -> Result<ContentDigest, SigilError> {
    let obj = proof_bundle
        .as_object()
        .ok_or_else(|| SigilError::Input("proof bundle must be a JSON object".into()))?;
    let claimed = obj
        .get("bundleHash")
        .and_then(Value::as_str)
        .ok_or_else(|| SigilError::Input("proof bundle missing bundleHash".into()))?;
    let claimed = ContentDigest::from_hex(claimed)?;

    let mut canonical = obj.clone();
    canonical.remove("bundleHash");
    let recomputed = sha256_digest(&CanonicalBytes::new(&Value::Object(canonical))?);
    if recomputed != claimed {
        return Err(SigilError::CryptoMismatch("bundle hash mismatch".into()));
    }

    let capsule = obj
        .get("proofCapsule")
        .ok_or_else(|| SigilError::Input("proof bundle missing proofCapsule".into()))?;
    let capsule = ProofCapsule::from_json(capsule)?;
    let claimed_capsule = digest_field(obj, "capsuleHash")?;
    if capsule.hash()? != claimed_capsule {
        return Err(SigilError::CryptoMismatch("capsule hash mismatch".into()));
    }

    if let Some(svg) = svg_bytes {
        if sha256_bytes(svg) != digest_field(obj, "svgHash")? {
            return Err(SigilError::CryptoMismatch("svg hash mismatch".into()));
        }
    }
    Ok(recomputed)
}

fn digest_field(obj: &Map<String, Value>, field: &str) -> Result<ContentDigest, SigilError> {
    let s = obj
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| SigilError::Input(format!("proof bundle missing {field}")))?;
    ContentDigest::from_hex(s)
}

fn manifest_file(name: &str, bytes: usize, sha256: ContentDigest) -> Value {
    serde_json::json!({ "name": name, "bytes": bytes, "sha256": sha256.to_hex() })
}

fn json_err(e: serde_json::Error) -> SigilError {
    SigilError::Canonicalization(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::Pulse;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="8"/></svg>"#;

    fn capsule() -> ProofCapsule {
        ProofCapsule::new("KPV-1", Pulse(7_777_777), "Crown", "c0ffee", "phi-7", "7777777-c0ffee")
            .unwrap()
    }

    fn proof() -> Value {
        serde_json::json!({
            "pi_a": ["1", "2", "1"],
            "pi_b": [["3", "4"], ["5", "6"], ["1", "0"]],
            "pi_c": ["7", "8", "1"],
            "protocol": "groth16",
            "curve": "bn128"
        })
    }

    fn build() -> CanonicalBundle {
        let capsule = capsule();
        CanonicalBundleBuilder::new(SVG, &capsule)
            .png_bytes(b"\x89PNG")
            .zk("12345", proof(), vec!["12345".into()])
            .build()
            .unwrap()
    }

    #[test]
    fn build_is_deterministic() {
        let a = build();
        let b = build();
        assert_eq!(a.svg_hash(), b.svg_hash());
        assert_eq!(a.bundle_hash(), b.bundle_hash());
        assert_eq!(a.proof_bundle_json(), b.proof_bundle_json());
        assert_eq!(a.manifest_json(), b.manifest_json());
    }

    #[test]
    fn bundle_hash_is_hash_of_canonical_object() {
        let b = build();
        let expected = sha256_digest(&CanonicalBytes::new(b.canonical_bundle_object()).unwrap());
        assert_eq!(b.bundle_hash(), expected);
        assert_eq!(b.svg_hash(), sha256_bytes(SVG.as_bytes()));
        assert_eq!(b.capsule_hash(), b.proof_capsule().hash().unwrap());
    }

    #[test]
    fn proof_bundle_json_is_canonical() {
        let b = build();
        let reparsed: Value = serde_json::from_str(b.proof_bundle_json()).unwrap();
        assert_eq!(
            CanonicalBytes::new(&reparsed).unwrap().as_str(),
            b.proof_bundle_json()
        );
        assert_eq!(reparsed["bundleHash"], Value::from(b.bundle_hash().to_hex()));
    }

    #[test]
    fn manifest_lists_files_and_binds_bundle_hash() {
        let b = build();
        let manifest: Value = serde_json::from_str(b.manifest_json()).unwrap();
        assert_eq!(manifest["bundleHash"], Value::from(b.bundle_hash().to_hex()));
        assert_eq!(manifest["pulse"], Value::from(7_777_777u64));
        let names: Vec<&str> = manifest["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec![SVG_FILE_NAME, PNG_FILE_NAME, PROOF_BUNDLE_FILE_NAME]);
    }

    #[test]
    fn manifest_omits_png_when_absent() {
        let capsule = capsule();
        let b = build_bundle(SVG, None, &capsule, "9", proof(), vec!["9".into()]).unwrap();
        assert!(!b.manifest_json().contains(PNG_FILE_NAME));
    }

    #[test]
    fn svg_change_changes_bundle_hash() {
        let capsule = capsule();
        let a = build_bundle(SVG, None, &capsule, "9", proof(), vec![]).unwrap();
        let b = build_bundle("<svg/>", None, &capsule, "9", proof(), vec![]).unwrap();
        assert_ne!(a.bundle_hash(), b.bundle_hash());
    }

    #[test]
    fn empty_commitment_rejected() {
        let capsule = capsule();
        let err = build_bundle(SVG, None, &capsule, "  ", proof(), vec![]).unwrap_err();
        assert!(matches!(err, SigilError::Input(_)));
    }

    #[test]
    fn mismatched_public_input_rejected() {
        let capsule = capsule();
        let err = build_bundle(SVG, None, &capsule, "1", proof(), vec!["2".into()]).unwrap_err();
        assert_eq!(err, SigilError::CryptoMismatch("ZK public input mismatch".into()));
    }

    #[test]
    fn invalid_capsule_rejected() {
        let mut capsule = capsule();
        capsule.phi_key.clear();
        let err = build_bundle(SVG, None, &capsule, "1", proof(), vec![]).unwrap_err();
        assert!(matches!(err, SigilError::Input(_)));
    }

    #[test]
    fn verify_proof_bundle_accepts_untampered() {
        let b = build();
        let hash = verify_proof_bundle(b.proof_bundle(), Some(SVG.as_bytes())).unwrap();
        assert_eq!(hash, b.bundle_hash());
    }

    #[test]
    fn verify_proof_bundle_detects_tampering() {
        let b = build();
        let mut tampered = b.proof_bundle().clone();
        tampered["zkPoseidonHash"] = Value::from("666");
        let err = verify_proof_bundle(&tampered, None).unwrap_err();
        assert!(matches!(err, SigilError::CryptoMismatch(_)));

        let err = verify_proof_bundle(b.proof_bundle(), Some(b"<svg/>")).unwrap_err();
        assert_eq!(err, SigilError::CryptoMismatch("svg hash mismatch".into()));
    }

    #[test]
    fn proof_bundle_shape_is_recognized() {
        let bundle = CanonicalBundleBuilder::new(SVG, &capsule())
            .zk("7", serde_json::json!({}), vec!["7".into()])
            .build()
            .unwrap();
        assert!(is_proof_bundle(bundle.proof_bundle()));
        let receipt = serde_json::json!({
            "bundleHash": bundle.bundle_hash().to_hex(),
            "zkPoseidonHash": "7",
            "verifiedAtPulse": 1,
        });
        assert!(!is_proof_bundle(&receipt));
        assert!(!is_proof_bundle(&serde_json::json!({"svgHash": "ab"})));
        assert!(!is_proof_bundle(&serde_json::json!(["bundleHash"])));
    }

}
