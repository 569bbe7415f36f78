//! # Proof System Trait
//!
//! Defines the interface the proof service drives. The production backend
//! is Groth16 over BN254 ([`crate::groth16::Groth16Bn254`]); tests plug in
//! misbehaving backends to exercise the self-check paths.
//!
//! ## Security Invariant
//!
//! The trait requires `Send + Sync + 'static` so a backend can be moved
//! onto a blocking worker thread. Proof generation and verification are
//! pure functions with no side effects beyond consuming randomness.

use serde_json::Value;
use thiserror::Error;

use crate::commitment::FieldCommitment;

/// Error during proof generation.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The circuit is unsatisfiable for this assignment.
    #[error("circuit error: {0}")]
    CircuitError(String),
    /// Internal prover error.
    #[error("prover error: {0}")]
    ProverError(String),
}

/// Error during proof verification or proof decoding.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The proof is malformed.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
    /// The public inputs do not fit the verifying key.
    #[error("key mismatch: {0}")]
    KeyMismatch(String),
}

/// Abstract interface for a zero-knowledge proof system.
pub trait ProofSystem: Send + Sync + 'static {
    /// Scheme name reported in proof hints, e.g. `groth16`.
    const SCHEME: &'static str;
    /// Curve name reported in proof hints, e.g. `bn128`.
    const CURVE: &'static str;

    /// The proof type produced by this system.
    type Proof: Clone + Send + Sync + 'static;
    /// The verifying key type.
    type VerifyingKey: Send + Sync + 'static;
    /// The proving key type.
    type ProvingKey: Send + Sync + 'static;

    /// Prove knowledge of an opening for `commitment`. Returns the proof and
    /// the public signals as canonical decimals.
    fn prove(
        &self,
        pk: &Self::ProvingKey,
        commitment: &FieldCommitment,
    ) -> Result<(Self::Proof, Vec<FieldCommitment>), ProofError>;

    /// Verify a proof against public signals.
    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public_inputs: &[FieldCommitment],
    ) -> Result<bool, VerifyError>;

    /// Wire (JSON) form of a proof.
    fn encode_proof(&self, proof: &Self::Proof) -> Value;

    /// Parse the wire form back into a proof.
    fn decode_proof(&self, value: &Value) -> Result<Self::Proof, VerifyError>;
}
