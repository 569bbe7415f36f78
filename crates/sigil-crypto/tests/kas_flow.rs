//! Author and receive ceremonies end to end.

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use serde_json::json;
use sha2::{Digest, Sha256};
use sigil_bundle::{CanonicalBundle, CanonicalBundleBuilder, ProofCapsule};
use sigil_core::{b64url_encode, ContentDigest, Pulse};
use sigil_crypto::{
    build_challenge, derive_owner_key, verify_attestation, AssertionResponse, AttestationSig,
    AttestedBundle, PublicKeyJwk, Scope, WebAuthnAssertion,
};

const RP: &str = "sigil.example";

fn bundle(slug: &str) -> CanonicalBundle {
    let capsule = ProofCapsule::new("KPV-1", Pulse(1000), "Root", "sig-abc", "phi-xyz", slug).unwrap();
    CanonicalBundleBuilder::new("<svg/>", &capsule)
        .zk("7", json!({"pi_a": ["1", "2", "1"]}), vec!["7".into()])
        .build()
        .unwrap()
}

/// Simulate an authenticator signing `challenge`.
fn sign(key: &SigningKey, cred: &[u8], challenge: &[u8], der: bool) -> WebAuthnAssertion {
    let client_data = json!({
        "type": "webauthn.get",
        "challenge": b64url_encode(challenge),
        "origin": format!("https://{RP}"),
    })
    .to_string();
    let mut auth_data = Sha256::digest(RP.as_bytes()).to_vec();
    auth_data.extend_from_slice(&[0x01, 0, 0, 0, 9]);
    let mut signed = auth_data.clone();
    signed.extend_from_slice(&Sha256::digest(client_data.as_bytes()));
    let sig: Signature = key.sign(&signed);
    let sig = if der {
        sig.to_der().as_bytes().to_vec()
    } else {
        sig.to_bytes().to_vec()
    };
    WebAuthnAssertion {
        id: b64url_encode(cred),
        raw_id: b64url_encode(cred),
        kind: "public-key".into(),
        response: AssertionResponse {
            authenticator_data: b64url_encode(&auth_data),
            client_data_json: b64url_encode(client_data.as_bytes()),
            signature: b64url_encode(sig),
            user_handle: None,
        },
    }
}

fn attest(
    key: &SigningKey,
    scope: Scope,
    hash: &ContentDigest,
    nonce: Option<&str>,
    pulse: Option<Pulse>,
) -> AttestationSig {
    let challenge = build_challenge(scope, hash, nonce).unwrap();
    let assertion = sign(key, b"cred", &challenge, scope == Scope::Receive);
    AttestationSig::from_assertion(
        scope,
        hash,
        nonce,
        &assertion,
        PublicKeyJwk::from_verifying_key(key.verifying_key()),
        pulse,
    )
    .unwrap()
}

#[test]
fn author_then_receive_leaves_bundle_untouched() {
    let minter = SigningKey::from_slice(&[1u8; 32]).unwrap();
    let receiver = SigningKey::from_slice(&[2u8; 32]).unwrap();
    let b = bundle("slug-1");
    let hash = b.bundle_hash();
    let json_before = b.proof_bundle_json().to_string();
    let manifest_before = b.manifest_json().to_string();

    let base = AttestedBundle::new(b);
    let authored = base
        .attach(attest(&minter, Scope::Author, &hash, None, Some(Pulse(1000))), &[])
        .unwrap();
    let received = authored
        .attach(
            attest(&receiver, Scope::Receive, &hash, Some("nonce-1"), Some(Pulse(2000))),
            &[RP.to_string()],
        )
        .unwrap();

    assert!(base.attestations().is_empty());
    assert_eq!(authored.attestations().len(), 1);
    assert_eq!(received.attestations().len(), 2);
    for view in [&base, &authored, &received] {
        assert_eq!(view.bundle().bundle_hash(), hash);
        assert_eq!(view.bundle().proof_bundle_json(), json_before);
        assert_eq!(view.bundle().manifest_json(), manifest_before);
    }
    assert!(received.verify_all(&[RP.to_string()]));
    assert!(!received.verify_all(&["elsewhere.example".to_string()]));

    let owner = received.owner_key().unwrap().unwrap();
    let jwk = PublicKeyJwk::from_verifying_key(receiver.verifying_key());
    assert_eq!(owner, derive_owner_key(&jwk, Pulse(2000), &hash).unwrap());
    assert!(authored.owner_key().is_none());
}

#[test]
fn second_author_is_refused() {
    let minter = SigningKey::from_slice(&[1u8; 32]).unwrap();
    let b = AttestedBundle::new(bundle("slug-1"));
    let hash = b.bundle().bundle_hash();
    let once = b.attach(attest(&minter, Scope::Author, &hash, None, None), &[]).unwrap();
    assert!(once.attach(attest(&minter, Scope::Author, &hash, None, None), &[]).is_err());
}

#[test]
fn attestation_does_not_transfer_to_another_bundle() {
    let minter = SigningKey::from_slice(&[1u8; 32]).unwrap();
    let a = bundle("slug-a");
    let b = bundle("slug-b");
    assert_ne!(a.bundle_hash(), b.bundle_hash());
    let sig = attest(&minter, Scope::Author, &a.bundle_hash(), None, None);
    assert!(verify_attestation(&sig, &a.bundle_hash(), &[]));
    assert!(!verify_attestation(&sig, &b.bundle_hash(), &[]));

    let mut unbound = sig.clone();
    unbound.binds = None;
    assert!(!verify_attestation(&unbound, &b.bundle_hash(), &[]));
    assert!(AttestedBundle::new(b).attach(sig, &[]).is_err());
}

#[test]
fn stored_fields_are_not_trusted() {
    let receiver = SigningKey::from_slice(&[2u8; 32]).unwrap();
    let hash = bundle("slug-1").bundle_hash();
    let sig = attest(&receiver, Scope::Receive, &hash, Some("nonce-1"), None);
    assert!(verify_attestation(&sig, &hash, &[]));

    let mut renonced = sig.clone();
    renonced.nonce = Some("nonce-2".into());
    assert!(!verify_attestation(&renonced, &hash, &[]));

    let mut rescoped = sig.clone();
    rescoped.scope = Scope::Author;
    assert!(!verify_attestation(&rescoped, &hash, &[]));

    let mut rechallenged = sig.clone();
    rechallenged.challenge = b64url_encode(hash.as_bytes());
    assert!(!verify_attestation(&rechallenged, &hash, &[]));

    let mut rekeyed = sig;
    rekeyed.pub_key_jwk =
        PublicKeyJwk::from_verifying_key(SigningKey::from_slice(&[3u8; 32]).unwrap().verifying_key());
    assert!(!verify_attestation(&rekeyed, &hash, &[]));
}

#[test]
fn from_assertion_refuses_a_mismatched_ceremony() {
    let key = SigningKey::from_slice(&[4u8; 32]).unwrap();
    let hash = bundle("slug-1").bundle_hash();
    let wrong = build_challenge(Scope::Receive, &hash, Some("other")).unwrap();
    let assertion = sign(&key, b"cred", &wrong, false);
    let err = AttestationSig::from_assertion(
        Scope::Receive,
        &hash,
        Some("nonce-1"),
        &assertion,
        PublicKeyJwk::from_verifying_key(key.verifying_key()),
        None,
    );
    assert!(err.is_err());
}

#[test]
fn attestation_json_uses_wire_names() {
    let key = SigningKey::from_slice(&[5u8; 32]).unwrap();
    let hash = bundle("slug-1").bundle_hash();
    let sig = attest(&key, Scope::Receive, &hash, Some("n"), Some(Pulse(5)));
    let v = serde_json::to_value(&sig).unwrap();
    for field in ["credId", "pubKeyJwk", "clientDataJSON", "authenticatorData", "createdAtPulse"] {
        assert!(v.get(field).is_some(), "{field}");
    }
    assert_eq!(v["scope"], "receive");
    assert_eq!(v["binds"]["bundleHash"], hash.to_hex());
    let back: AttestationSig = serde_json::from_value(v).unwrap();
    assert_eq!(back, sig);
}
