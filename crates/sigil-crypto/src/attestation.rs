//! # Attestation Signatures (KAS)
//!
//! An [`AttestationSig`] is a WebAuthn assertion bound to a bundle hash,
//! stored together with everything needed to re-verify it offline.
//!
//! ## Security Invariant
//!
//! [`verify_attestation`] never trusts the stored `challenge`, `scope`
//! binding, or `binds` fields. It recomputes the challenge from the scope,
//! the bundle hash the caller supplies, and the stored nonce, and requires
//! the stored challenge and the client data challenge to both equal it.

use serde::{Deserialize, Serialize};
use sigil_core::{b64url_decode, b64url_encode, ContentDigest, Pulse};
use subtle::ConstantTimeEq;

use crate::challenge::{build_challenge, Scope, KAS_VERSION};
use crate::error::KasError;
use crate::jwk::PublicKeyJwk;
use crate::webauthn::{verify_assertion_for_rp, AssertionResponse, WebAuthnAssertion};

/// COSE name of ECDSA P-256 with SHA-256.
pub const ALG_ES256: &str = "ES256";

/// What an attestation claims to be bound to. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binds {
    pub bundle_hash: ContentDigest,
}

/// A stored KAS signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationSig {
    pub version: String,
    pub scope: Scope,
    pub alg: String,
    pub cred_id: String,
    pub pub_key_jwk: PublicKeyJwk,
    pub challenge: String,
    pub signature: String,
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binds: Option<Binds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_pulse: Option<Pulse>,
}

impl AttestationSig {
    /// Capture a signing ceremony's assertion as an attestation.
    ///
    /// The assertion must already verify against the challenge for
    /// `(scope, bundle_hash, nonce)` under `jwk`; an attestation that could
    /// not be re-verified later is refused here.
    pub fn from_assertion(
        scope: Scope,
        bundle_hash: &ContentDigest,
        nonce: Option<&str>,
        assertion: &WebAuthnAssertion,
        jwk: PublicKeyJwk,
        created_at_pulse: Option<Pulse>,
    ) -> Result<Self, KasError> {
        let challenge = build_challenge(scope, bundle_hash, nonce)?;
        let raw_id = b64url_decode(&assertion.raw_id)?;
        if !verify_assertion_for_rp(assertion, &challenge, &jwk, Some(&raw_id), &[]) {
            return Err(KasError::Input(format!(
                "{scope} assertion does not verify for bundle {}",
                bundle_hash.to_hex()
            )));
        }
        Ok(Self {
            version: KAS_VERSION.to_string(),
            scope,
            alg: ALG_ES256.to_string(),
            cred_id: b64url_encode(&raw_id),
            pub_key_jwk: jwk,
            challenge: b64url_encode(&challenge),
            signature: assertion.response.signature.clone(),
            authenticator_data: assertion.response.authenticator_data.clone(),
            client_data_json: assertion.response.client_data_json.clone(),
            nonce: match scope {
                Scope::Author => None,
                Scope::Receive => nonce.map(str::to_string),
            },
            binds: Some(Binds {
                bundle_hash: *bundle_hash,
            }),
            created_at_pulse,
        })
    }

    /// The assertion this attestation was captured from.
    pub fn to_assertion(&self) -> WebAuthnAssertion {
        WebAuthnAssertion {
            id: self.cred_id.clone(),
            raw_id: self.cred_id.clone(),
            kind: "public-key".into(),
            response: AssertionResponse {
                authenticator_data: self.authenticator_data.clone(),
                client_data_json: self.client_data_json.clone(),
                signature: self.signature.clone(),
                user_handle: None,
            },
        }
    }
}

/// Verify `sig` as an attestation over `bundle_hash`.
///
/// `rp_ids` is the ordered list of allowed relying parties; empty skips
/// the relying-party check.
pub fn verify_attestation(sig: &AttestationSig, bundle_hash: &ContentDigest, rp_ids: &[String]) -> bool {
    if sig.version != KAS_VERSION || sig.alg != ALG_ES256 {
        tracing::debug!(version = %sig.version, alg = %sig.alg, "attestation rejected: unsupported version or alg");
        return false;
    }
    if let Some(binds) = &sig.binds {
        if binds.bundle_hash != *bundle_hash {
            tracing::debug!("attestation rejected: binds a different bundle");
            return false;
        }
    }
    let expected = match build_challenge(sig.scope, bundle_hash, sig.nonce.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "attestation rejected: cannot rebuild challenge");
            return false;
        }
    };
    let stored_matches = b64url_decode(&sig.challenge)
        .map(|stored| bool::from(stored.ct_eq(&expected)))
        .unwrap_or(false);
    if !stored_matches {
        tracing::debug!(scope = %sig.scope, "attestation rejected: stored challenge mismatch");
        return false;
    }
    let cred_id = match b64url_decode(&sig.cred_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(error = %e, "attestation rejected: bad credential id");
            return false;
        }
    };
    verify_assertion_for_rp(&sig.to_assertion(), &expected, &sig.pub_key_jwk, Some(&cred_id), rp_ids)
}
