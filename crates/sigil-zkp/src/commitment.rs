//! # Canonical Commitment Derivation
//!
//! Bridges an arbitrary 256-bit hash into the BN254 scalar field the
//! proving circuit works over:
//!
//! ```text
//! hi, lo   = digest[0..16], digest[16..32]
//! joined   = pad32(hi) ++ pad32(lo)           // 64 bytes, left zero-padded
//! h        = BLAKE3(joined)
//! c        = int_be(h) mod r                   // r = BN254 scalar modulus
//! render   = decimal(c)
//! ```
//!
//! Each half fits in a field element on its own, so the padded encoding is
//! the same pair of limbs a circuit would take as inputs. A decimal input
//! (`poseidonHash` / `zkPoseidonHash`) is already a field element; it is
//! reduced and rendered canonically, so `"007"` and `"7"` commit to the same
//! value.
//!
//! ## Security Invariant
//!
//! The decimal rendering is the only representation that crosses the wire
//! and the first public signal of every proof must equal it byte-for-byte.

use std::str::FromStr;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sigil_core::ContentDigest;

use crate::error::ZkError;

/// How a commitment was derived, reported back in proof hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Derivation {
    /// `payloadHashHex` → split128 → BLAKE3 → field.
    Split128Blake3,
    /// Decimal field element supplied directly.
    FieldElement,
}

/// A field element rendered as a canonical decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCommitment(String);

impl FieldCommitment {
    /// Render a field element canonically.
    pub fn from_field(value: Fr) -> Self {
        Self(BigUint::from(value.into_bigint()).to_string())
    }

    /// Parse a canonical decimal that must already be below the modulus.
    ///
    /// Used for public signals coming back from the wire, where a
    /// non-reduced value means tampering rather than a convenience input.
    pub fn parse_canonical(s: &str) -> Result<Self, ZkError> {
        let n = parse_decimal(s)?;
        if n >= BigUint::from(Fr::MODULUS) {
            return Err(ZkError::Input(format!(
                "public signal {s} is not reduced modulo the scalar field"
            )));
        }
        Ok(Self(n.to_string()))
    }

    /// The field element this commitment denotes.
    pub fn to_field(&self) -> Fr {
        // Invariant: the inner string is always a canonical decimal below r.
        BigUint::from_str(&self.0).map(Fr::from).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldCommitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a proof request's commitment comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitmentInput {
    /// A 64-hex-character payload hash.
    PayloadHash(ContentDigest),
    /// A decimal field element.
    Poseidon(String),
}

impl CommitmentInput {
    /// Pick the first non-empty input in precedence order:
    /// `payloadHashHex`, `poseidonHash`, `zkPoseidonHash`.
    pub fn from_fields(
        payload_hash_hex: Option<&str>,
        poseidon_hash: Option<&str>,
        zk_poseidon_hash: Option<&str>,
    ) -> Result<Self, ZkError> {
        if let Some(hex) = non_empty(payload_hash_hex) {
            let digest = ContentDigest::from_hex(hex)
                .map_err(|e| ZkError::Input(format!("payloadHashHex: {e}")))?;
            return Ok(Self::PayloadHash(digest));
        }
        if let Some(dec) = non_empty(poseidon_hash).or_else(|| non_empty(zk_poseidon_hash)) {
            return Ok(Self::Poseidon(dec.to_string()));
        }
        Err(ZkError::Input(
            "missing payloadHashHex, poseidonHash or zkPoseidonHash".into(),
        ))
    }

    /// Derive the canonical commitment.
    pub fn derive(&self) -> Result<(FieldCommitment, Derivation), ZkError> {
        match self {
            Self::PayloadHash(digest) => {
                Ok((commitment_from_digest(digest), Derivation::Split128Blake3))
            }
            Self::Poseidon(dec) => {
                let n = parse_decimal(dec)?;
                Ok((FieldCommitment::from_field(Fr::from(n)), Derivation::FieldElement))
            }
        }
    }
}

/// `split128 → pad → BLAKE3 → mod r` over a 256-bit digest.
pub fn commitment_from_digest(digest: &ContentDigest) -> FieldCommitment {
    let (hi, lo) = digest.as_bytes().split_at(16);
    let mut joined = [0u8; 64];
    joined[16..32].copy_from_slice(hi);
    joined[48..64].copy_from_slice(lo);
    let h = blake3::hash(&joined);
    FieldCommitment::from_field(Fr::from_be_bytes_mod_order(h.as_bytes()))
}

/// Big-endian 32-byte encoding of a commitment's field element.
pub fn commitment_bytes(c: &FieldCommitment) -> [u8; 32] {
    let bytes = c.to_field().into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_decimal(s: &str) -> Result<BigUint, ZkError> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ZkError::Input(format!(
            "field element must be a non-negative decimal, got {s:?}"
        )));
    }
    BigUint::from_str(s).map_err(|e| ZkError::Input(format!("invalid decimal: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_core::sha256_bytes;

    #[test]
    fn small_decimals_are_identity() {
        for s in ["0", "1", "2", "12345"] {
            let (c, d) = CommitmentInput::Poseidon(s.into()).derive().unwrap();
            assert_eq!(c.as_str(), s);
            assert_eq!(d, Derivation::FieldElement);
        }
    }

    #[test]
    fn leading_zeros_are_normalized() {
        let (c, _) = CommitmentInput::Poseidon("0007".into()).derive().unwrap();
        assert_eq!(c.as_str(), "7");
    }

    #[test]
    fn values_above_modulus_are_reduced() {
        let r = BigUint::from(Fr::MODULUS);
        let over = (&r + 5u32).to_string();
        let (c, _) = CommitmentInput::Poseidon(over.clone()).derive().unwrap();
        assert_eq!(c.as_str(), "5");
        assert!(FieldCommitment::parse_canonical(&over).is_err());
    }

    #[test]
    fn rejects_non_decimal() {
        for bad in ["-1", "0x10", "1.5", "abc"] {
            assert!(CommitmentInput::Poseidon(bad.into()).derive().is_err(), "{bad}");
        }
    }

    #[test]
    fn payload_hash_derivation_is_deterministic_and_in_field() {
        let digest = sha256_bytes(b"sigil payload");
        let a = commitment_from_digest(&digest);
        let b = commitment_from_digest(&digest);
        assert_eq!(a, b);
        let n = BigUint::from_str(a.as_str()).unwrap();
        assert!(n < BigUint::from(Fr::MODULUS));
    }

    #[test]
    fn payload_hash_matches_manual_split_pad_hash() {
        let digest = sha256_bytes(b"abc");
        let mut joined = Vec::with_capacity(64);
        joined.extend_from_slice(&[0u8; 16]);
        joined.extend_from_slice(&digest.as_bytes()[..16]);
        joined.extend_from_slice(&[0u8; 16]);
        joined.extend_from_slice(&digest.as_bytes()[16..]);
        let h = blake3::hash(&joined);
        let expected = BigUint::from_bytes_be(h.as_bytes()) % BigUint::from(Fr::MODULUS);
        assert_eq!(commitment_from_digest(&digest).as_str(), expected.to_string());
    }

    #[test]
    fn swapping_halves_changes_commitment() {
        let digest = sha256_bytes(b"x");
        let mut swapped = [0u8; 32];
        swapped[..16].copy_from_slice(&digest.as_bytes()[16..]);
        swapped[16..].copy_from_slice(&digest.as_bytes()[..16]);
        assert_ne!(
            commitment_from_digest(&digest),
            commitment_from_digest(&ContentDigest::from_bytes(swapped))
        );
    }

    #[test]
    fn field_precedence() {
        let hex = sha256_bytes(b"p").to_hex();
        let input = CommitmentInput::from_fields(Some(&hex), Some("1"), Some("2")).unwrap();
        assert!(matches!(input, CommitmentInput::PayloadHash(_)));
        let input = CommitmentInput::from_fields(Some(""), None, Some("2")).unwrap();
        assert_eq!(input, CommitmentInput::Poseidon("2".into()));
        assert!(CommitmentInput::from_fields(None, Some("  "), None).is_err());
    }

    #[test]
    fn commitment_bytes_are_big_endian() {
        let c = FieldCommitment::from_field(Fr::from(258u64));
        let bytes = commitment_bytes(&c);
        assert_eq!(&bytes[30..], &[1, 2]);
        assert!(bytes[..30].iter().all(|b| *b == 0));
    }

    proptest::proptest! {
        #[test]
        fn canonical_rendering_is_a_fixed_point(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 32)) {
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes);
            let c = commitment_from_digest(&ContentDigest::from_bytes(arr));
            let again = FieldCommitment::parse_canonical(c.as_str()).unwrap();
            proptest::prop_assert_eq!(&again, &c);
            let (rederived, _) = CommitmentInput::Poseidon(c.as_str().into()).derive().unwrap();
            proptest::prop_assert_eq!(rederived, c);
        }
    }
}
