//! # Attested Bundles
//!
//! An [`AttestedBundle`] pairs a [`CanonicalBundle`] with the KAS
//! signatures made over it. Attaching a signature yields a new value and
//! leaves both the bundle and the original attested value untouched; the
//! bundle itself is shared, never copied or rebuilt, so its bytes and
//! hash cannot drift.

use std::sync::Arc;

use serde_json::{json, Value};
use sigil_bundle::CanonicalBundle;

use crate::attestation::{verify_attestation, AttestationSig};
use crate::challenge::Scope;
use crate::error::KasError;
use crate::owner::derive_owner_key;

#[derive(Debug, Clone)]
pub struct AttestedBundle {
    bundle: Arc<CanonicalBundle>,
    attestations: Vec<AttestationSig>,
}

impl AttestedBundle {
    pub fn new(bundle: CanonicalBundle) -> Self {
        Self::from_shared(Arc::new(bundle))
    }

    pub fn from_shared(bundle: Arc<CanonicalBundle>) -> Self {
        Self {
            bundle,
            attestations: Vec::new(),
        }
    }

    pub fn bundle(&self) -> &CanonicalBundle {
        &self.bundle
    }

    pub fn attestations(&self) -> &[AttestationSig] {
        &self.attestations
    }

    /// Return a copy with `sig` appended.
    ///
    /// The signature must verify against this bundle's hash. A bundle has
    /// at most one author attestation.
    pub fn attach(&self, sig: AttestationSig, rp_ids: &[String]) -> Result<Self, KasError> {
        let bundle_hash = self.bundle.bundle_hash();
        if !verify_attestation(&sig, &bundle_hash, rp_ids) {
            return Err(KasError::Input(format!(
                "{} attestation does not verify for bundle {}",
                sig.scope,
                bundle_hash.to_hex()
            )));
        }
        if sig.scope == Scope::Author && self.author().is_some() {
            return Err(KasError::Input("bundle already has an author attestation".into()));
        }
        let mut attestations = self.attestations.clone();
        attestations.push(sig);
        Ok(Self {
            bundle: Arc::clone(&self.bundle),
            attestations,
        })
    }

    pub fn author(&self) -> Option<&AttestationSig> {
        self.attestations.iter().find(|s| s.scope == Scope::Author)
    }

    /// The most recent receive attestation, i.e. the current holder.
    pub fn latest_receive(&self) -> Option<&AttestationSig> {
        self.attestations.iter().rev().find(|s| s.scope == Scope::Receive)
    }

    /// Owner key of the current holder, if the last receive attestation
    /// carries its ceremony pulse.
    pub fn owner_key(&self) -> Option<Result<String, KasError>> {
        let sig = self.latest_receive()?;
        let pulse = sig.created_at_pulse?;
        Some(derive_owner_key(&sig.pub_key_jwk, pulse, &self.bundle.bundle_hash()))
    }

    /// Re-verify every attestation against the bundle hash.
    pub fn verify_all(&self, rp_ids: &[String]) -> bool {
        let bundle_hash = self.bundle.bundle_hash();
        self.attestations
            .iter()
            .all(|sig| verify_attestation(sig, &bundle_hash, rp_ids))
    }

    /// The proof bundle with the attestations alongside it.
    pub fn to_json(&self) -> Value {
        json!({
            "proofBundle": self.bundle.proof_bundle(),
            "kas": self.attestations,
        })
    }
}
