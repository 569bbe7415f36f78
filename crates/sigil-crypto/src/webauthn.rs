//! # WebAuthn Assertion Verification
//!
//! Verifies a `navigator.credentials.get()` assertion made with a P-256
//! credential:
//!
//! 1. assertion `type` is `public-key` and client data `type` is
//!    `webauthn.get`;
//! 2. the raw credential id equals the expected one, when given;
//! 3. the client data challenge is exactly the unpadded base64url encoding
//!    of the expected challenge;
//! 4. when relying-party ids are configured, `authenticatorData[0..32]` is
//!    `SHA256(rpId)` for one of them, tried in order;
//! 5. the signature over `authenticatorData ++ SHA256(clientDataJSON)`
//!    verifies under the JWK key.
//!
//! Authenticators disagree on the signature encoding, so step 5 tries each
//! entry of [`SIGNATURE_ENCODINGS`] in order and accepts the first that
//! verifies.
//!
//! ## Security Invariant
//!
//! Verification is fail-closed. Every failure, including malformed input,
//! returns `false`; the reason is logged at `debug` and never returned to
//! the caller.

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sigil_core::{b64url_decode, b64url_encode};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::jwk::PublicKeyJwk;

const ASSERTION_TYPE: &str = "public-key";
const CLIENT_DATA_GET: &str = "webauthn.get";

/// rpIdHash (32) + flags (1) + signCount (4).
const MIN_AUTHENTICATOR_DATA: usize = 37;

/// A WebAuthn assertion as serialized by the browser, binary fields in
/// base64url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthnAssertion {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub response: AssertionResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientData {
    #[serde(rename = "type")]
    kind: String,
    challenge: String,
}

/// Wire encodings of an ECDSA signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    /// 64-byte `r ‖ s`.
    Raw,
    /// ASN.1 `SEQUENCE { INTEGER r, INTEGER s }`.
    Der,
}

/// Order in which signature encodings are attempted.
pub const SIGNATURE_ENCODINGS: [SignatureEncoding; 2] =
    [SignatureEncoding::Raw, SignatureEncoding::Der];

impl SignatureEncoding {
    fn parse(self, bytes: &[u8]) -> Option<Signature> {
        match self {
            Self::Raw if bytes.len() == 64 => Signature::from_slice(bytes).ok(),
            Self::Raw => None,
            Self::Der => der_to_raw(bytes).and_then(|raw| Signature::from_slice(&raw).ok()),
        }
    }
}

#[derive(Debug, Error)]
enum Rejection {
    #[error("assertion type {0:?} is not public-key")]
    AssertionType(String),
    #[error("client data type {0:?} is not webauthn.get")]
    ClientDataType(String),
    #[error("credential id mismatch")]
    CredentialId,
    #[error("challenge mismatch")]
    Challenge,
    #[error("authenticator data too short: {0} bytes")]
    AuthenticatorData(usize),
    #[error("rpIdHash matches none of the allowed relying parties")]
    RelyingParty,
    #[error("no signature encoding verified")]
    Signature,
    #[error("malformed {0}: {1}")]
    Malformed(&'static str, String),
}

/// Verify an assertion without a relying-party check.
pub fn verify_assertion(
    assertion: &WebAuthnAssertion,
    expected_challenge: &[u8],
    jwk: &PublicKeyJwk,
    expected_cred_id: Option<&[u8]>,
) -> bool {
    verify_assertion_for_rp(assertion, expected_challenge, jwk, expected_cred_id, &[])
}

/// Verify an assertion, additionally requiring the authenticator data to
/// name one of `rp_ids`. An empty list skips the relying-party check.
pub fn verify_assertion_for_rp(
    assertion: &WebAuthnAssertion,
    expected_challenge: &[u8],
    jwk: &PublicKeyJwk,
    expected_cred_id: Option<&[u8]>,
    rp_ids: &[String],
) -> bool {
    match check(assertion, expected_challenge, jwk, expected_cred_id, rp_ids) {
        Ok(encoding) => {
            tracing::debug!(cred_id = %assertion.id, ?encoding, "assertion verified");
            true
        }
        Err(reason) => {
            tracing::debug!(cred_id = %assertion.id, %reason, "assertion rejected");
            false
        }
    }
}

fn check(
    assertion: &WebAuthnAssertion,
    expected_challenge: &[u8],
    jwk: &PublicKeyJwk,
    expected_cred_id: Option<&[u8]>,
    rp_ids: &[String],
) -> Result<SignatureEncoding, Rejection> {
    if assertion.kind != ASSERTION_TYPE {
        return Err(Rejection::AssertionType(assertion.kind.clone()));
    }

    let client_data_bytes = decode("clientDataJSON", &assertion.response.client_data_json)?;
    let client_data: ClientData = serde_json::from_slice(&client_data_bytes)
        .map_err(|e| Rejection::Malformed("clientDataJSON", e.to_string()))?;
    if client_data.kind != CLIENT_DATA_GET {
        return Err(Rejection::ClientDataType(client_data.kind));
    }

    if let Some(expected) = expected_cred_id {
        let raw_id = decode("rawId", &assertion.raw_id)?;
        if !bool::from(raw_id.ct_eq(expected)) {
            return Err(Rejection::CredentialId);
        }
    }

    // Compared as text: only the canonical unpadded spelling is accepted.
    let expected = b64url_encode(expected_challenge);
    if !bool::from(client_data.challenge.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(Rejection::Challenge);
    }

    let auth_data = decode("authenticatorData", &assertion.response.authenticator_data)?;
    if auth_data.len() < MIN_AUTHENTICATOR_DATA {
        return Err(Rejection::AuthenticatorData(auth_data.len()));
    }
    if !rp_ids.is_empty() {
        let rp_id_hash = &auth_data[..32];
        let matched = rp_ids
            .iter()
            .any(|rp| Sha256::digest(rp.as_bytes()).as_slice() == rp_id_hash);
        if !matched {
            return Err(Rejection::RelyingParty);
        }
    }

    let key: VerifyingKey = jwk
        .to_verifying_key()
        .map_err(|e| Rejection::Malformed("pubKeyJwk", e.to_string()))?;
    let sig_bytes = decode("signature", &assertion.response.signature)?;

    let mut signed = auth_data;
    signed.extend_from_slice(&Sha256::digest(&client_data_bytes));

    for encoding in SIGNATURE_ENCODINGS {
        let Some(sig) = encoding.parse(&sig_bytes) else {
            continue;
        };
        let sig = sig.normalize_s().unwrap_or(sig);
        if key.verify(&signed, &sig).is_ok() {
            return Ok(encoding);
        }
    }
    Err(Rejection::Signature)
}

fn decode(field: &'static str, value: &str) -> Result<Vec<u8>, Rejection> {
    b64url_decode(value).map_err(|e| Rejection::Malformed(field, e.to_string()))
}

/// Convert a DER ECDSA signature to raw `r ‖ s`, each left-padded to 32
/// bytes. Returns `None` for anything that is not exactly one SEQUENCE of
/// two INTEGERs that fit in 32 bytes.
pub fn der_to_raw(der: &[u8]) -> Option<[u8; 64]> {
    let mut pos = 0;
    if *der.get(pos)? != 0x30 {
        return None;
    }
    pos += 1;
    let seq_len = read_len(der, &mut pos)?;
    if pos + seq_len != der.len() {
        return None;
    }

    let mut out = [0u8; 64];
    for half in 0..2 {
        if *der.get(pos)? != 0x02 {
            return None;
        }
        pos += 1;
        let len = read_len(der, &mut pos)?;
        let mut int = der.get(pos..pos + len)?;
        pos += len;
        while int.len() > 1 && int[0] == 0 {
            int = &int[1..];
        }
        if int.len() > 32 {
            return None;
        }
        let end = 32 * (half + 1);
        out[end - int.len()..end].copy_from_slice(int);
    }
    (pos == der.len()).then_some(out)
}

fn read_len(buf: &[u8], pos: &mut usize) -> Option<usize> {
    let first = *buf.get(*pos)?;
    *pos += 1;
    match first {
        0..=0x7f => Some(first as usize),
        0x81 => {
            let len = *buf.get(*pos)?;
            *pos += 1;
            Some(len as usize)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::SigningKey;
    use serde_json::json;

    const RP: &str = "sigil.example";

    fn signer() -> SigningKey {
        SigningKey::from_slice(&[11u8; 32]).unwrap()
    }

    fn assertion(challenge: &[u8], der: bool, kind: &str) -> WebAuthnAssertion {
        signed_assertion(&b64url_encode(challenge), der, kind)
    }

    fn signed_assertion(challenge_text: &str, der: bool, kind: &str) -> WebAuthnAssertion {
        let client_data = json!({
            "type": kind,
            "challenge": challenge_text,
            "origin": "https://sigil.example",
        })
        .to_string();
        let mut auth_data = Sha256::digest(RP.as_bytes()).to_vec();
        auth_data.extend_from_slice(&[0x05, 0, 0, 0, 1]);
        let mut signed = auth_data.clone();
        signed.extend_from_slice(&Sha256::digest(client_data.as_bytes()));
        let sig: Signature = signer().sign(&signed);
        let sig_bytes = if der {
            sig.to_der().as_bytes().to_vec()
        } else {
            sig.to_bytes().to_vec()
        };
        WebAuthnAssertion {
            id: b64url_encode(b"cred-1"),
            raw_id: b64url_encode(b"cred-1"),
            kind: "public-key".into(),
            response: AssertionResponse {
                authenticator_data: b64url_encode(&auth_data),
                client_data_json: b64url_encode(client_data.as_bytes()),
                signature: b64url_encode(sig_bytes),
                user_handle: None,
            },
        }
    }

    fn jwk() -> PublicKeyJwk {
        PublicKeyJwk::from_verifying_key(signer().verifying_key())
    }

    #[test]
    fn raw_and_der_signatures_verify() {
        let challenge = [9u8; 32];
        for der in [false, true] {
            let a = assertion(&challenge, der, CLIENT_DATA_GET);
            assert!(verify_assertion(&a, &challenge, &jwk(), Some(b"cred-1")), "der={der}");
            assert_eq!(
                check(&a, &challenge, &jwk(), None, &[]).unwrap(),
                if der { SignatureEncoding::Der } else { SignatureEncoding::Raw }
            );
        }
    }

    #[test]
    fn wrong_challenge_is_rejected() {
        let a = assertion(&[1u8; 32], false, CLIENT_DATA_GET);
        assert!(!verify_assertion(&a, &[2u8; 32], &jwk(), None));
    }

    #[test]
    fn non_canonical_challenge_spelling_is_rejected() {
        let challenge = [9u8; 32];
        let canonical = b64url_encode(challenge);
        assert!(verify_assertion(&signed_assertion(&canonical, false, CLIENT_DATA_GET), &challenge, &jwk(), None));

        // Same bytes, padded: a correctly signed assertion still fails.
        let padded = format!("{canonical}=");
        assert_eq!(b64url_decode(&padded).unwrap(), challenge);
        let a = signed_assertion(&padded, false, CLIENT_DATA_GET);
        assert!(!verify_assertion(&a, &challenge, &jwk(), None));
        assert!(matches!(check(&a, &challenge, &jwk(), None, &[]), Err(Rejection::Challenge)));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let challenge = [1u8; 32];
        let a = assertion(&challenge, false, "webauthn.create");
        assert!(!verify_assertion(&a, &challenge, &jwk(), None));

        let mut a = assertion(&challenge, false, CLIENT_DATA_GET);
        a.kind = "password".into();
        assert!(!verify_assertion(&a, &challenge, &jwk(), None));
    }

    #[test]
    fn credential_id_is_enforced_when_given() {
        let challenge = [1u8; 32];
        let a = assertion(&challenge, false, CLIENT_DATA_GET);
        assert!(verify_assertion(&a, &challenge, &jwk(), None));
        assert!(!verify_assertion(&a, &challenge, &jwk(), Some(b"cred-2")));
    }

    #[test]
    fn relying_party_list_is_checked_in_order() {
        let challenge = [1u8; 32];
        let a = assertion(&challenge, false, CLIENT_DATA_GET);
        let ok = vec!["other.example".to_string(), RP.to_string()];
        assert!(verify_assertion_for_rp(&a, &challenge, &jwk(), None, &ok));
        let bad = vec!["other.example".to_string()];
        assert!(!verify_assertion_for_rp(&a, &challenge, &jwk(), None, &bad));
    }

    #[test]
    fn wrong_key_or_tampered_data_is_rejected() {
        let challenge = [1u8; 32];
        let a = assertion(&challenge, true, CLIENT_DATA_GET);
        let other = SigningKey::from_slice(&[12u8; 32]).unwrap();
        let other_jwk = PublicKeyJwk::from_verifying_key(other.verifying_key());
        assert!(!verify_assertion(&a, &challenge, &other_jwk, None));

        let mut tampered = a.clone();
        let mut auth = b64url_decode(&tampered.response.authenticator_data).unwrap();
        auth[32] ^= 1;
        tampered.response.authenticator_data = b64url_encode(auth);
        assert!(!verify_assertion(&tampered, &challenge, &jwk(), None));
    }

    #[test]
    fn malformed_fields_fail_closed() {
        let challenge = [1u8; 32];
        let mut a = assertion(&challenge, false, CLIENT_DATA_GET);
        a.response.signature = "!!!".into();
        assert!(!verify_assertion(&a, &challenge, &jwk(), None));

        let mut a = assertion(&challenge, false, CLIENT_DATA_GET);
        a.response.client_data_json = b64url_encode(b"not json");
        assert!(!verify_assertion(&a, &challenge, &jwk(), None));

        let mut a = assertion(&challenge, false, CLIENT_DATA_GET);
        a.response.authenticator_data = b64url_encode([0u8; 10]);
        assert!(!verify_assertion(&a, &challenge, &jwk(), None));
    }

    #[test]
    fn der_conversion_pads_and_strips() {
        // r = 0x00ff (sign byte), s = 0x01
        let der = [0x30, 0x07, 0x02, 0x02, 0x00, 0xff, 0x02, 0x01, 0x01];
        let raw = der_to_raw(&der).unwrap();
        assert_eq!(raw[31], 0xff);
        assert!(raw[..31].iter().all(|b| *b == 0));
        assert_eq!(raw[63], 0x01);
        assert!(raw[32..63].iter().all(|b| *b == 0));
    }

    #[test]
    fn der_conversion_rejects_garbage() {
        assert!(der_to_raw(&[]).is_none());
        assert!(der_to_raw(&[0x30, 0x03, 0x02, 0x01, 0x01]).is_none());
        assert!(der_to_raw(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x00]).is_none());
        let mut long = vec![0x30, 0x46, 0x02, 0x21];
        long.extend_from_slice(&[0x7f; 33]);
        long.extend_from_slice(&[0x02, 0x21]);
        long.extend_from_slice(&[0x7f; 33]);
        assert!(der_to_raw(&long).is_none());
    }

    proptest::proptest! {
        #[test]
        fn der_to_raw_never_panics(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..80)) {
            let _ = der_to_raw(&bytes);
        }
    }
}
