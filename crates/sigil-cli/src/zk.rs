//! # ZK Subcommand
//!
//! Trusted setup writes `sigil.pk`, `sigil.vk` and `artifacts.json` into a
//! directory; the API server and `prove`/`verify` load them from there.
//! `--seed` makes setup reproducible and is meant for tests and local
//! development only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use sigil_zkp::{
    setup_artifacts, ArtifactManifest, CommitmentInput, ProofResult, ZkProofService,
    DEFAULT_PROOF_TIMEOUT, DEFAULT_VERIFICATION_VERSION,
};

use crate::{read_json, EXIT_VERIFY_FAILED};

#[derive(Args, Debug)]
pub struct ZkArgs {
    #[command(subcommand)]
    pub command: ZkCommand,
}

#[derive(Subcommand, Debug)]
pub enum ZkCommand {
    /// Generate Groth16 proving and verifying keys.
    Setup {
        /// Artifact directory to write.
        #[arg(long)]
        dir: PathBuf,
        /// Deterministic RNG seed. Never use for production keys.
        #[arg(long)]
        seed: Option<u64>,
        /// Version string recorded in the manifest and in every receipt.
        #[arg(long, default_value = DEFAULT_VERIFICATION_VERSION)]
        verification_version: String,
    },

    /// Prove knowledge of the commitment for a payload hash or field element.
    Prove {
        #[arg(long)]
        dir: PathBuf,
        /// 64-hex-character payload hash.
        #[arg(long, conflicts_with = "poseidon", required_unless_present = "poseidon")]
        payload_hash: Option<String>,
        /// Decimal field element.
        #[arg(long)]
        poseidon: Option<String>,
    },

    /// Verify a proof JSON (`zkPoseidonHash`, `zkProof`, `zkPublicInputs`).
    Verify {
        #[arg(long)]
        dir: PathBuf,
        file: PathBuf,
    },
}

/// Execute the zk subcommand.
pub fn run_zk(args: &ZkArgs) -> Result<u8> {
    match &args.command {
        ZkCommand::Setup {
            dir,
            seed,
            verification_version,
        } => {
            let manifest = setup(dir, *seed, verification_version)?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            Ok(0)
        }
        ZkCommand::Prove {
            dir,
            payload_hash,
            poseidon,
        } => {
            let result = prove(dir, payload_hash.as_deref(), poseidon.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(0)
        }
        ZkCommand::Verify { dir, file } => {
            if verify(dir, &read_json(file)?)? {
                println!("valid");
                Ok(0)
            } else {
                println!("invalid");
                Ok(EXIT_VERIFY_FAILED)
            }
        }
    }
}

pub fn setup(dir: &Path, seed: Option<u64>, verification_version: &str) -> Result<ArtifactManifest> {
    if seed.is_some() {
        tracing::warn!("seeded setup: keys are reproducible and must not be used in production");
    }
    setup_artifacts(dir, seed, verification_version)
        .with_context(|| format!("setup failed in {}", dir.display()))
}

pub fn prove(dir: &Path, payload_hash: Option<&str>, poseidon: Option<&str>) -> Result<ProofResult> {
    let service = load(dir)?;
    let input = CommitmentInput::from_fields(payload_hash, poseidon, None)?;
    Ok(service.generate_blocking(&input)?)
}

/// Verify the proof fields of `proof` (a `prove` output or a proof bundle).
pub fn verify(dir: &Path, proof: &Value) -> Result<bool> {
    let service = load(dir)?;
    let commitment = proof
        .get("zkPoseidonHash")
        .and_then(Value::as_str)
        .context("missing zkPoseidonHash")?;
    let zk_proof = proof.get("zkProof").context("missing zkProof")?;
    let inputs: Vec<String> = serde_json::from_value(
        proof
            .get("zkPublicInputs")
            .cloned()
            .context("missing zkPublicInputs")?,
    )
    .context("zkPublicInputs must be an array of strings")?;
    Ok(service.verify_commitment(commitment, zk_proof, &inputs))
}

fn load(dir: &Path) -> Result<ZkProofService> {
    ZkProofService::load(dir, DEFAULT_PROOF_TIMEOUT)
        .with_context(|| format!("cannot load proof artifacts from {}", dir.display()))
}
