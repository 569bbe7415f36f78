//! # sigil-cli: Operator Tooling for the Sigil Stack
//!
//! ## Subcommands
//!
//! - `sigil zk`: Groth16 trusted setup, proving, and proof verification.
//! - `sigil share`: Encode bundles into share payloads/URLs and decode them.
//! - `sigil bundle`: Recompute a proof bundle's hash chain.
//! - `sigil kas`: Build ceremony challenges and verify attested bundles.
//! - `sigil receipt`: Hash a verification receipt or check it against an
//!   expected hash.
//!
//! ```bash
//! sigil zk setup --dir ./artifacts --seed 7
//! sigil zk prove --dir ./artifacts --poseidon 1 > proof.json
//! sigil zk verify --dir ./artifacts proof.json
//! sigil share encode bundle.json --base-url https://sigil.example/s
//! sigil kas verify attested.json --rp-id sigil.example
//! sigil receipt hash receipt.json --expect 3f5a...
//! ```
//!
//! Handlers return an exit code: `0` success, `2` a verification that ran
//! and failed. Errors (unreadable files, bad input) surface as exit code `1`.

pub mod bundle;
pub mod kas;
pub mod receipt;
pub mod share;
pub mod zk;

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Exit code for a check that ran to completion and failed.
pub const EXIT_VERIFY_FAILED: u8 = 2;

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let bytes =
        std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("{} is not valid JSON", path.display()))
}
