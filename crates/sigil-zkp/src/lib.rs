//! # sigil-zkp: Zero-Knowledge Commitments for Sigil Bundles
//!
//! Derives the canonical field commitment for a bundle's payload hash and
//! proves knowledge of it with Groth16 over BN254.
//!
//! - [`commitment`]: hash-to-field derivation and canonical decimal form.
//! - [`circuit`]: the commitment-binding R1CS.
//! - [`groth16`]: the arkworks backend and snarkjs-style proof JSON.
//! - [`artifacts`]: key setup and integrity-checked loading.
//! - [`service`]: the self-verifying, deadline-bounded proof service.
//!
//! The [`ProofSystem`] trait keeps the service independent of the backend.

pub mod artifacts;
pub mod circuit;
pub mod commitment;
pub mod error;
pub mod groth16;
pub mod service;
pub mod traits;

pub use artifacts::{
    load_artifacts, setup_artifacts, ArtifactManifest, SigilKeys, DEFAULT_VERIFICATION_VERSION,
};
pub use circuit::{SigilCircuit, CIRCUIT_ID, PUBLIC_INPUT_COUNT};
pub use commitment::{commitment_from_digest, CommitmentInput, Derivation, FieldCommitment};
pub use error::ZkError;
pub use groth16::Groth16Bn254;
pub use service::{ProofHints, ProofResult, ZkProofService, DEFAULT_PROOF_TIMEOUT};
pub use traits::{ProofError, ProofSystem, VerifyError};
