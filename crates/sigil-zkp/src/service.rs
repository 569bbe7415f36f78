//! # Proof Service
//!
//! [`ZkProofService`] turns a payload hash or a field element into a
//! Groth16 proof whose first public signal is the canonical commitment.
//!
//! Before a proof leaves the service it is checked twice: the first public
//! signal must equal the commitment the service derived, and the proof must
//! verify against the loaded verifying key. A proof failing either check is
//! dropped and the caller gets a [`ZkError::CryptoMismatch`].
//!
//! Proving runs on the blocking pool under a deadline. Concurrent requests
//! for the same commitment share one computation. When the deadline passes
//! the caller gets [`ZkError::Timeout`] and whatever the worker eventually
//! produces is discarded.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigil_core::SingleFlight;

use crate::artifacts::{load_artifacts, SigilKeys};
use crate::circuit::PUBLIC_INPUT_COUNT;
use crate::commitment::{CommitmentInput, FieldCommitment};
use crate::error::ZkError;
use crate::groth16::Groth16Bn254;
use crate::traits::ProofSystem;

/// Default deadline for one proof.
pub const DEFAULT_PROOF_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata a verifier needs to pick the right key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofHints {
    pub scheme: String,
    pub curve: String,
    pub circuit_id: String,
    pub verification_version: String,
    pub public_input_count: usize,
}

/// A self-verified proof, in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofResult {
    pub zk_poseidon_hash: String,
    pub zk_proof: Value,
    pub zk_public_inputs: Vec<String>,
    pub proof_hints: ProofHints,
}

struct Inner<P: ProofSystem> {
    system: P,
    proving_key: P::ProvingKey,
    verifying_key: P::VerifyingKey,
    circuit_id: String,
    verification_version: String,
    timeout: Duration,
    flight: SingleFlight<FieldCommitment, Result<ProofResult, ZkError>>,
}

/// Shared handle to a proof system and its keys. Cloning is cheap.
pub struct ZkProofService<P: ProofSystem = Groth16Bn254> {
    inner: Arc<Inner<P>>,
}

impl<P: ProofSystem> Clone for ZkProofService<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: ProofSystem> std::fmt::Debug for ZkProofService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkProofService")
            .field("circuit_id", &self.inner.circuit_id)
            .field("verification_version", &self.inner.verification_version)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

impl ZkProofService<Groth16Bn254> {
    /// Load Groth16 keys from an artifact directory.
    pub fn load(dir: &Path, timeout: Duration) -> Result<Self, ZkError> {
        let SigilKeys {
            manifest,
            proving_key,
            verifying_key,
        } = load_artifacts(dir)?;
        Ok(Self::new(
            Groth16Bn254,
            proving_key,
            verifying_key,
            &manifest.circuit_id,
            &manifest.verification_version,
            timeout,
        ))
    }
}

impl<P: ProofSystem> ZkProofService<P> {
    pub fn new(
        system: P,
        proving_key: P::ProvingKey,
        verifying_key: P::VerifyingKey,
        circuit_id: &str,
        verification_version: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                system,
                proving_key,
                verifying_key,
                circuit_id: circuit_id.to_string(),
                verification_version: verification_version.to_string(),
                timeout,
                flight: SingleFlight::new(),
            }),
        }
    }

    pub fn verification_version(&self) -> &str {
        &self.inner.verification_version
    }

    pub fn hints(&self) -> ProofHints {
        self.inner.hints()
    }

    /// Prove for `input` on the calling thread, with no deadline.
    pub fn generate_blocking(&self, input: &CommitmentInput) -> Result<ProofResult, ZkError> {
        let (commitment, _) = input.derive()?;
        prove_checked(&self.inner, &commitment)
    }

    /// Prove for `input` on the blocking pool, coalescing concurrent
    /// requests for the same commitment.
    pub async fn generate(&self, input: &CommitmentInput) -> Result<ProofResult, ZkError> {
        let (commitment, derivation) = input.derive()?;
        tracing::debug!(commitment = %commitment, ?derivation, "proof requested");
        let inner = Arc::clone(&self.inner);
        let key = commitment.clone();
        self.inner
            .flight
            .run(key, || async move {
                let timeout = inner.timeout;
                let worker = Arc::clone(&inner);
                let task = tokio::task::spawn_blocking(move || prove_checked(&worker, &commitment));
                match tokio::time::timeout(timeout, task).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(join)) => {
                        tracing::error!(error = %join, "prover task failed");
                        Err(ZkError::Prover(join.to_string()))
                    }
                    Err(_) => {
                        tracing::warn!(?timeout, "proof generation timed out");
                        Err(ZkError::Timeout(timeout))
                    }
                }
            })
            .await
    }

    /// Verify a wire proof against wire public signals.
    ///
    /// Fails closed: any malformed input yields `false`.
    pub fn verify(&self, zk_proof: &Value, zk_public_inputs: &[String]) -> bool {
        let signals = match zk_public_inputs
            .iter()
            .map(|s| FieldCommitment::parse_canonical(s))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(signals) => signals,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting proof: bad public signal");
                return false;
            }
        };
        let proof = match self.inner.system.decode_proof(zk_proof) {
            Ok(proof) => proof,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting proof: undecodable");
                return false;
            }
        };
        match self
            .inner
            .system
            .verify(&self.inner.verifying_key, &proof, &signals)
        {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting proof");
                false
            }
        }
    }

    /// Verify that `zk_proof` proves `zk_poseidon_hash`: the first public
    /// signal must be that value and the proof must verify.
    pub fn verify_commitment(
        &self,
        zk_poseidon_hash: &str,
        zk_proof: &Value,
        zk_public_inputs: &[String],
    ) -> bool {
        if zk_public_inputs.first().map(String::as_str) != Some(zk_poseidon_hash) {
            tracing::debug!("rejecting proof: first public signal is not the commitment");
            return false;
        }
        self.verify(zk_proof, zk_public_inputs)
    }
}

impl<P: ProofSystem> Inner<P> {
    fn hints(&self) -> ProofHints {
        ProofHints {
            scheme: P::SCHEME.to_string(),
            curve: P::CURVE.to_string(),
            circuit_id: self.circuit_id.clone(),
            verification_version: self.verification_version.clone(),
            public_input_count: PUBLIC_INPUT_COUNT,
        }
    }
}

fn prove_checked<P: ProofSystem>(
    inner: &Inner<P>,
    commitment: &FieldCommitment,
) -> Result<ProofResult, ZkError> {
    let (proof, signals) = inner
        .system
        .prove(&inner.proving_key, commitment)
        .map_err(|e| ZkError::Prover(e.to_string()))?;

    if signals.first() != Some(commitment) {
        tracing::error!(commitment = %commitment, "prover returned a foreign public signal");
        return Err(ZkError::CryptoMismatch("ZK public input mismatch".into()));
    }

    match inner.system.verify(&inner.verifying_key, &proof, &signals) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            tracing::error!(commitment = %commitment, "fresh proof failed self-verification");
            return Err(ZkError::CryptoMismatch(
                "ZK proof failed self-verification".into(),
            ));
        }
    }

    Ok(ProofResult {
        zk_poseidon_hash: commitment.to_string(),
        zk_proof: inner.system.encode_proof(&proof),
        zk_public_inputs: signals.iter().map(ToString::to_string).collect(),
        proof_hints: inner.hints(),
    })
}
