//! # sigil-crypto: Key-Bound Attestation (KAS)
//!
//! Binds hardware-backed WebAuthn signatures to sigil bundles:
//!
//! - **Challenges** ([`challenge`]): the byte-exact challenge for an author
//!   or receive ceremony.
//! - **Assertions** ([`webauthn`]): P-256 assertion verification with raw
//!   and DER signature encodings and an optional relying-party check.
//! - **Attestations** ([`attestation`], [`attested`]): stored signatures,
//!   their re-verification, and bundles carrying them.
//! - **Owner keys** ([`owner`]): deterministic receiver identifiers.
//!
//! ## Crate Policy
//!
//! - Verification returns `bool` and fails closed.
//! - Challenge comparison is constant-time.
//! - Depends on `sigil-core` and `sigil-bundle` internally.

pub mod attestation;
pub mod attested;
pub mod challenge;
pub mod error;
pub mod jwk;
pub mod owner;
pub mod webauthn;

pub use attestation::{verify_attestation, AttestationSig, Binds, ALG_ES256};
pub use attested::AttestedBundle;
pub use challenge::{build_challenge, Scope, KAS_VERSION};
pub use error::KasError;
pub use jwk::PublicKeyJwk;
pub use owner::derive_owner_key;
pub use webauthn::{
    der_to_raw, verify_assertion, verify_assertion_for_rp, AssertionResponse, SignatureEncoding,
    WebAuthnAssertion, SIGNATURE_ENCODINGS,
};
