//! # sigil CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sigil_cli::bundle::{run_bundle, BundleArgs};
use sigil_cli::kas::{run_kas, KasArgs};
use sigil_cli::receipt::{run_receipt, ReceiptArgs};
use sigil_cli::share::{run_share, ShareArgs};
use sigil_cli::zk::{run_zk, ZkArgs};

/// Sigil stack operator tooling.
#[derive(Parser, Debug)]
#[command(name = "sigil", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Groth16 setup, proving, and verification.
    Zk(ZkArgs),

    /// Share payload encoding and decoding.
    Share(ShareArgs),

    /// Proof bundle hash-chain checks.
    Bundle(BundleArgs),

    /// WebAuthn attestation challenges and checks.
    Kas(KasArgs),

    /// Verification receipt hashing.
    Receipt(ReceiptArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Zk(args) => run_zk(&args),
        Commands::Share(args) => run_share(&args),
        Commands::Bundle(args) => run_bundle(&args),
        Commands::Kas(args) => run_kas(&args),
        Commands::Receipt(args) => run_receipt(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use sigil_cli::zk::ZkCommand;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_zk_setup_defaults() {
        let cli = Cli::try_parse_from(["sigil", "zk", "setup", "--dir", "out"]).unwrap();
        let Commands::Zk(args) = cli.command else {
            panic!("expected zk");
        };
        let ZkCommand::Setup {
            seed,
            verification_version,
            ..
        } = args.command
        else {
            panic!("expected setup");
        };
        assert_eq!(seed, None);
        assert_eq!(verification_version, sigil_zkp::DEFAULT_VERIFICATION_VERSION);
    }

    #[test]
    fn prove_requires_exactly_one_input() {
        assert!(Cli::try_parse_from(["sigil", "zk", "prove", "--dir", "a"]).is_err());
        assert!(Cli::try_parse_from([
            "sigil", "zk", "prove", "--dir", "a", "--poseidon", "1", "--payload-hash", "ab"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["sigil", "zk", "prove", "--dir", "a", "--poseidon", "1"]).is_ok());
    }

    #[test]
    fn kas_verify_collects_rp_ids() {
        let cli = Cli::try_parse_from([
            "sigil", "kas", "verify", "a.json", "--rp-id", "one.example", "--rp-id", "two.example",
        ])
        .unwrap();
        let Commands::Kas(args) = cli.command else {
            panic!("expected kas");
        };
        let sigil_cli::kas::KasCommand::Verify { rp_ids, .. } = args.command else {
            panic!("expected verify");
        };
        assert_eq!(rp_ids, vec!["one.example", "two.example"]);
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["sigil", "-vv", "share", "decode", "c1:AA"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
