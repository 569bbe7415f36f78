//! # Key Artifacts
//!
//! An artifact directory holds the Groth16 keys for [`SigilCircuit`]:
//!
//! ```text
//! artifacts/
//!   sigil.pk          compressed ProvingKey<Bn254>
//!   sigil.vk          compressed VerifyingKey<Bn254>
//!   artifacts.json    circuit id, verification version, key SHA-256s
//! ```
//!
//! Loading is all-or-nothing. A missing file, a key whose hash disagrees
//! with the manifest, or a manifest for a different circuit is an
//! [`ZkError::Artifact`], which is fatal and never retried.
//!
//! [`SigilCircuit`]: crate::circuit::SigilCircuit

use std::fs;
use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{PreparedVerifyingKey, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::rngs::{OsRng, StdRng};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sigil_core::sha256_bytes;

use crate::circuit::CIRCUIT_ID;
use crate::error::ZkError;
use crate::groth16::{self, Groth16Bn254};
use crate::traits::ProofSystem;

pub const PROVING_KEY_FILE: &str = "sigil.pk";
pub const VERIFYING_KEY_FILE: &str = "sigil.vk";
pub const MANIFEST_FILE: &str = "artifacts.json";

/// Version tag stamped into receipts verified against these keys.
pub const DEFAULT_VERIFICATION_VERSION: &str = "KVR-groth16-bn254-1";

/// Contents of `artifacts.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactManifest {
    pub circuit_id: String,
    pub verification_version: String,
    pub scheme: String,
    pub curve: String,
    pub proving_key_sha256: String,
    pub verifying_key_sha256: String,
}

/// Keys loaded from an artifact directory, ready for the proof service.
pub struct SigilKeys {
    pub manifest: ArtifactManifest,
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: PreparedVerifyingKey<Bn254>,
}

impl std::fmt::Debug for SigilKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigilKeys")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

/// Generate fresh keys into `dir`, overwriting existing artifacts.
///
/// With `seed` the setup is reproducible, which is only suitable for tests
/// and local development: anyone holding the seed can forge proofs.
pub fn setup_artifacts(
    dir: &Path,
    seed: Option<u64>,
    verification_version: &str,
) -> Result<ArtifactManifest, ZkError> {
    let (pk, vk) = match seed {
        Some(seed) => groth16::setup(&mut StdRng::seed_from_u64(seed)),
        None => groth16::setup(&mut OsRng),
    }
    .map_err(|e| ZkError::Artifact(format!("trusted setup failed: {e}")))?;

    let mut pk_bytes = Vec::new();
    pk.serialize_compressed(&mut pk_bytes)
        .map_err(|e| ZkError::Artifact(format!("serialize proving key: {e}")))?;
    let mut vk_bytes = Vec::new();
    vk.serialize_compressed(&mut vk_bytes)
        .map_err(|e| ZkError::Artifact(format!("serialize verifying key: {e}")))?;

    let manifest = ArtifactManifest {
        circuit_id: CIRCUIT_ID.to_string(),
        verification_version: verification_version.to_string(),
        scheme: Groth16Bn254::SCHEME.to_string(),
        curve: Groth16Bn254::CURVE.to_string(),
        proving_key_sha256: sha256_bytes(&pk_bytes).to_hex(),
        verifying_key_sha256: sha256_bytes(&vk_bytes).to_hex(),
    };
    let manifest_json = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| ZkError::Artifact(format!("serialize manifest: {e}")))?;

    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    write(dir, PROVING_KEY_FILE, &pk_bytes)?;
    write(dir, VERIFYING_KEY_FILE, &vk_bytes)?;
    write(dir, MANIFEST_FILE, &manifest_json)?;

    tracing::info!(
        dir = %dir.display(),
        circuit_id = CIRCUIT_ID,
        seeded = seed.is_some(),
        "wrote sigil key artifacts"
    );
    Ok(manifest)
}

/// Load and integrity-check the artifacts in `dir`.
pub fn load_artifacts(dir: &Path) -> Result<SigilKeys, ZkError> {
    let manifest_bytes = read(dir, MANIFEST_FILE)?;
    let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ZkError::Artifact(format!("{MANIFEST_FILE} is malformed: {e}")))?;

    if manifest.circuit_id != CIRCUIT_ID {
        return Err(ZkError::Artifact(format!(
            "artifacts are for circuit {:?}, expected {CIRCUIT_ID:?}",
            manifest.circuit_id
        )));
    }

    let pk_bytes = read(dir, PROVING_KEY_FILE)?;
    check_hash(PROVING_KEY_FILE, &pk_bytes, &manifest.proving_key_sha256)?;
    let vk_bytes = read(dir, VERIFYING_KEY_FILE)?;
    check_hash(VERIFYING_KEY_FILE, &vk_bytes, &manifest.verifying_key_sha256)?;

    let proving_key = ProvingKey::<Bn254>::deserialize_compressed(pk_bytes.as_slice())
        .map_err(|e| ZkError::Artifact(format!("{PROVING_KEY_FILE} is corrupt: {e}")))?;
    let verifying_key = VerifyingKey::<Bn254>::deserialize_compressed(vk_bytes.as_slice())
        .map_err(|e| ZkError::Artifact(format!("{VERIFYING_KEY_FILE} is corrupt: {e}")))?;

    tracing::info!(
        dir = %dir.display(),
        verification_version = %manifest.verification_version,
        "loaded sigil key artifacts"
    );
    Ok(SigilKeys {
        manifest,
        proving_key,
        verifying_key: groth16::prepare(&verifying_key),
    })
}

fn check_hash(name: &str, bytes: &[u8], expected: &str) -> Result<(), ZkError> {
    let actual = sha256_bytes(bytes).to_hex();
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(ZkError::Artifact(format!(
            "{name} hash {actual} does not match manifest {expected}"
        )));
    }
    Ok(())
}

fn read(dir: &Path, name: &str) -> Result<Vec<u8>, ZkError> {
    let path = dir.join(name);
    fs::read(&path).map_err(|e| io_error(&path, e))
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), ZkError> {
    let path = dir.join(name);
    fs::write(&path, bytes).map_err(|e| io_error(&path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> ZkError {
    ZkError::Artifact(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let written = setup_artifacts(dir.path(), Some(1), DEFAULT_VERIFICATION_VERSION).unwrap();
        let keys = load_artifacts(dir.path()).unwrap();
        assert_eq!(keys.manifest, written);
        assert_eq!(keys.manifest.circuit_id, CIRCUIT_ID);
    }

    #[test]
    fn seeded_setup_is_reproducible() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let ma = setup_artifacts(a.path(), Some(5), "v").unwrap();
        let mb = setup_artifacts(b.path(), Some(5), "v").unwrap();
        assert_eq!(ma, mb);
    }

    #[test]
    fn missing_directory_is_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifacts(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ZkError::Artifact(_)));
    }

    #[test]
    fn corrupted_key_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        setup_artifacts(dir.path(), Some(2), "v").unwrap();
        let path = dir.path().join(VERIFYING_KEY_FILE);
        let mut bytes = fs::read(&path).unwrap();
        bytes[0] ^= 0xff;
        fs::write(&path, bytes).unwrap();
        let err = load_artifacts(dir.path()).unwrap_err();
        assert!(matches!(err, ZkError::Artifact(msg) if msg.contains("does not match")));
    }

    #[test]
    fn foreign_circuit_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = setup_artifacts(dir.path(), Some(3), "v").unwrap();
        manifest.circuit_id = "other-circuit".into();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();
        let err = load_artifacts(dir.path()).unwrap_err();
        assert!(matches!(err, ZkError::Artifact(msg) if msg.contains("other-circuit")));
    }
}
