//! # Bundle Subcommand
//!
//! Recomputes `bundleHash` and `capsuleHash` for a serialized proof bundle,
//! and `svgHash` when the SVG is supplied.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sigil_bundle::verify_proof_bundle;
use sigil_core::SigilError;

use crate::{read_json, EXIT_VERIFY_FAILED};

#[derive(Args, Debug)]
pub struct BundleArgs {
    #[command(subcommand)]
    pub command: BundleCommand,
}

#[derive(Subcommand, Debug)]
pub enum BundleCommand {
    /// Check a proof bundle's hash chain.
    Verify {
        file: PathBuf,
        /// The sigil SVG the bundle claims to describe.
        #[arg(long)]
        svg: Option<PathBuf>,
    },
}

/// Execute the bundle subcommand.
pub fn run_bundle(args: &BundleArgs) -> Result<u8> {
    match &args.command {
        BundleCommand::Verify { file, svg } => {
            let bundle = read_json(file)?;
            let svg_bytes = svg
                .as_ref()
                .map(|p| std::fs::read(p).with_context(|| format!("cannot read {}", p.display())))
                .transpose()?;
            match verify_proof_bundle(&bundle, svg_bytes.as_deref()) {
                Ok(hash) => {
                    println!("{}", hash.to_hex());
                    Ok(0)
                }
                Err(SigilError::CryptoMismatch(reason)) => {
                    eprintln!("{reason}");
                    Ok(EXIT_VERIFY_FAILED)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
