//! # sigil-bundle: Canonical Bundle Construction
//!
//! Turns a minted sigil (SVG text, optional PNG, proof capsule, ZK proof)
//! into a [`CanonicalBundle`]: one deterministic byte form per logical
//! value, and the SHA-256 chain (`svgHash`, `capsuleHash`, `bundleHash`)
//! that downstream attestations, receipts and share links bind to.
//!
//! ## Crate Policy
//!
//! - Depends only on `sigil-core` internally.
//! - Building is pure: identical inputs yield byte-identical output.
//! - Nothing in this crate mutates a bundle after it is built.

pub mod bundle;
pub mod capsule;

pub use bundle::{
    build_bundle, is_proof_bundle, verify_proof_bundle, CanonicalBundle, CanonicalBundleBuilder,
};
pub use capsule::{ProofCapsule, REQUIRED_CAPSULE_FIELDS};
