//! # sigil-core: Foundational Types for the Sigil Stack
//!
//! This crate is the leaf of the workspace DAG. It defines the primitives
//! every other crate builds on: canonical bytes, content digests, wire
//! encodings, the pulse timestamp, and the error taxonomy.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** ALL digest computation over structured
//!    values flows through `CanonicalBytes::new()` (RFC 8785 JCS). No raw
//!    `serde_json::to_vec()` for hashes, ever.
//!
//! 2. **Raw artifact bytes are hashed explicitly.** SVG and PNG payloads are
//!    not JSON; they go through [`sha256_bytes`], whose name makes the
//!    non-canonical input visible at the call site.
//!
//! 3. **One error taxonomy.** [`SigilError`] carries the categories the
//!    pipeline distinguishes (input, crypto mismatch, artifact, size limit).
//!    Cache misses are not errors.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sigil-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod flight;
pub mod pulse;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_bytes, sha256_digest, sha256_hex, ContentDigest};
pub use encoding::{b64url_decode, b64url_encode, hex_decode};
pub use error::{CanonicalizationError, SigilError};
pub use flight::SingleFlight;
pub use pulse::Pulse;
