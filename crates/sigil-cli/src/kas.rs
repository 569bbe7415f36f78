//! # KAS Subcommand
//!
//! - `sigil kas challenge` prints the base64url challenge an authenticator
//!   must sign for an author or receive ceremony.
//! - `sigil kas verify` checks every attestation in an attested bundle
//!   (`{ "proofBundle": ..., "kas": [...] }`) against the recomputed
//!   `bundleHash`, and prints the current holder's owner key.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use sigil_bundle::verify_proof_bundle;
use sigil_core::{b64url_encode, ContentDigest, SigilError};
use sigil_crypto::{build_challenge, derive_owner_key, verify_attestation, AttestationSig, Scope};

use crate::{read_json, EXIT_VERIFY_FAILED};

#[derive(Args, Debug)]
pub struct KasArgs {
    #[command(subcommand)]
    pub command: KasCommand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Author,
    Receive,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Author => Scope::Author,
            ScopeArg::Receive => Scope::Receive,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum KasCommand {
    /// Print the challenge to sign for a bundle.
    Challenge {
        #[arg(long, value_enum)]
        scope: ScopeArg,
        /// Bundle hash (64 hex characters).
        #[arg(long)]
        bundle_hash: String,
        /// Transfer nonce. Required for `receive`.
        #[arg(long)]
        nonce: Option<String>,
    },
    /// Verify the attestations of an attested bundle.
    Verify {
        file: PathBuf,
        /// Allowed relying-party id. Repeat to allow several, tried in order.
        #[arg(long = "rp-id")]
        rp_ids: Vec<String>,
    },
}

/// Execute the kas subcommand.
pub fn run_kas(args: &KasArgs) -> Result<u8> {
    match &args.command {
        KasCommand::Challenge {
            scope,
            bundle_hash,
            nonce,
        } => {
            let hash = ContentDigest::from_hex(bundle_hash)?;
            let challenge = build_challenge((*scope).into(), &hash, nonce.as_deref())
                .map_err(SigilError::from)?;
            println!("{}", b64url_encode(challenge));
            Ok(0)
        }
        KasCommand::Verify { file, rp_ids } => {
            let attested = read_json(file)?;
            let proof_bundle = attested
                .get("proofBundle")
                .with_context(|| format!("{} has no proofBundle", file.display()))?;
            let sigs: Vec<AttestationSig> = match attested.get("kas") {
                Some(kas) => serde_json::from_value(kas.clone())
                    .with_context(|| format!("{} has malformed kas entries", file.display()))?,
                None => Vec::new(),
            };

            let bundle_hash = match verify_proof_bundle(proof_bundle, None) {
                Ok(hash) => hash,
                Err(SigilError::CryptoMismatch(reason)) => {
                    eprintln!("{reason}");
                    return Ok(EXIT_VERIFY_FAILED);
                }
                Err(e) => return Err(e.into()),
            };

            let mut failed = 0usize;
            for (i, sig) in sigs.iter().enumerate() {
                let ok = verify_attestation(sig, &bundle_hash, rp_ids);
                println!("{i}\t{}\t{}", sig.scope, if ok { "ok" } else { "FAILED" });
                if !ok {
                    failed += 1;
                }
            }
            if failed > 0 {
                eprintln!("{failed} of {} attestations failed", sigs.len());
                return Ok(EXIT_VERIFY_FAILED);
            }

            // The latest receive attestation names the current holder.
            if let Some(holder) = sigs.iter().rev().find(|s| s.scope == Scope::Receive) {
                if let Some(pulse) = holder.created_at_pulse {
                    let owner = derive_owner_key(&holder.pub_key_jwk, pulse, &bundle_hash)
                        .map_err(SigilError::from)?;
                    println!("owner\t{owner}");
                }
            }
            Ok(0)
        }
    }
}
