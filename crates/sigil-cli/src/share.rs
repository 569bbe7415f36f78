//! # Share Subcommand
//!
//! `encode` prints a `c1:` payload (or a full URL with `--base-url`);
//! `decode` accepts a bare payload or a share URL and prints the bundle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use sigil_share::{ShareCodec, SharePayload};
use url::Url;

use crate::read_json;

#[derive(Args, Debug)]
pub struct ShareArgs {
    #[command(subcommand)]
    pub command: ShareCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShareCommand {
    /// Encode a JSON file as a share payload.
    Encode {
        file: PathBuf,
        /// Emit a full share URL with `?p=` appended to this base.
        #[arg(long)]
        base_url: Option<Url>,
        /// Uncompressed base64url form understood by older readers.
        #[arg(long, conflicts_with = "base_url")]
        legacy: bool,
    },

    /// Decode a share payload or URL.
    Decode {
        /// `c1:` payload, legacy payload, or URL carrying `?p=` / `?r=`.
        input: String,
    },
}

/// Execute the share subcommand.
pub fn run_share(args: &ShareArgs) -> Result<u8> {
    let codec = ShareCodec::default();
    match &args.command {
        ShareCommand::Encode {
            file,
            base_url,
            legacy,
        } => {
            let bundle = read_json(file)?;
            println!("{}", encode(&codec, &bundle, base_url.as_ref(), *legacy)?);
        }
        ShareCommand::Decode { input } => {
            let decoded = decode(&codec, input)?;
            tracing::info!(format = ?decoded.format, "decoded share payload");
            println!("{}", serde_json::to_string_pretty(&decoded.bundle)?);
        }
    }
    Ok(0)
}

pub fn encode(
    codec: &ShareCodec,
    bundle: &Value,
    base_url: Option<&Url>,
    legacy: bool,
) -> Result<String> {
    if legacy {
        return Ok(codec.encode_legacy(bundle)?);
    }
    match base_url {
        Some(base) => Ok(codec.share_url(base, bundle)?.to_string()),
        None => Ok(codec.encode(bundle)?),
    }
}

/// Anything that parses as an absolute URL is treated as a share link.
pub fn decode(codec: &ShareCodec, input: &str) -> Result<SharePayload> {
    let input = input.trim();
    if Url::parse(input).is_ok() {
        return codec.decode_url(input).context("cannot decode share url");
    }
    codec.decode(input).context("cannot decode share payload")
}
