//! # Receipt Subcommand

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sigil_receipt::{assert_receipt_hash_match, hash_receipt, VerificationReceipt};

use crate::{read_json, EXIT_VERIFY_FAILED};

#[derive(Args, Debug)]
pub struct ReceiptArgs {
    #[command(subcommand)]
    pub command: ReceiptCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReceiptCommand {
    /// Print `SHA256(JCS(receipt))`, or compare it with `--expect`.
    Hash {
        file: PathBuf,
        /// Expected receipt hash (hex). Exit code 2 on mismatch.
        #[arg(long)]
        expect: Option<String>,
    },
}

/// Execute the receipt subcommand.
pub fn run_receipt(args: &ReceiptArgs) -> Result<u8> {
    match &args.command {
        ReceiptCommand::Hash { file, expect } => {
            let receipt: VerificationReceipt = serde_json::from_value(read_json(file)?)
                .with_context(|| format!("{} is not a verification receipt", file.display()))?;
            match expect {
                None => {
                    println!("{}", hash_receipt(&receipt)?.to_hex());
                    Ok(0)
                }
                Some(expected) => match assert_receipt_hash_match(&receipt, expected) {
                    Ok(()) => {
                        println!("match");
                        Ok(0)
                    }
                    Err(e) => {
                        eprintln!("{e}");
                        Ok(EXIT_VERIFY_FAILED)
                    }
                },
            }
        }
    }
}
