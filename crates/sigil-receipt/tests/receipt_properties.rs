//! Property tests over receipt hashing and cache keys.

use proptest::prelude::*;
use sigil_core::{sha256_bytes, ContentDigest, Pulse};
use sigil_receipt::{assert_receipt_hash_match, cache_key, hash_receipt, VerificationReceipt};

fn receipt(seed: &[u8], zk: &str, pulse: u64, verifier: &str, version: &str) -> VerificationReceipt {
    VerificationReceipt::new(sha256_bytes(seed), zk, Pulse(pulse), verifier, version)
}

proptest! {
    #[test]
    fn own_hash_always_matches(
        seed in proptest::collection::vec(any::<u8>(), 0..64),
        zk in "[0-9]{1,40}",
        pulse in any::<u64>(),
        verifier in "[a-z-]{1,16}",
    ) {
        let r = receipt(&seed, &zk, pulse, &verifier, "v1");
        let h = hash_receipt(&r).unwrap();
        prop_assert!(assert_receipt_hash_match(&r, &h.to_hex()).is_ok());
    }

    #[test]
    fn pulse_change_changes_hash(pulse in 0u64..u64::MAX) {
        let a = receipt(b"b", "1", pulse, "v", "v1");
        let b = receipt(b"b", "1", pulse + 1, "v", "v1");
        prop_assert_ne!(hash_receipt(&a).unwrap(), hash_receipt(&b).unwrap());
        prop_assert!(assert_receipt_hash_match(&b, &hash_receipt(&a).unwrap().to_hex()).is_err());
    }

    #[test]
    fn cache_key_depends_on_every_part(zk in "[0-9]{1,20}", version in "[a-z0-9-]{1,12}") {
        let bundle = sha256_bytes(b"bundle");
        let other = ContentDigest::from_bytes([7u8; 32]);
        let base = cache_key(&bundle, &zk, &version);
        prop_assert_ne!(base, cache_key(&other, &zk, &version));
        prop_assert_ne!(base, cache_key(&bundle, &format!("{zk}0"), &version));
        prop_assert_ne!(base, cache_key(&bundle, &zk, &format!("{version}x")));
    }
}
