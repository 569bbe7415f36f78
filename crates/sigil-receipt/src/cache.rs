//! # Verification Cache
//!
//! Verifying a Groth16 proof costs a few pairings, and the same bundle is
//! verified every time its share link is opened. Results are cached under
//!
//! ```text
//! cacheKey = SHA256(bundleHash ++ zkPoseidonHash ++ verificationVersion)
//! ```
//!
//! ## Security Invariant
//!
//! A stored entry is returned only when its `bundleHash`, `zkPoseidonHash`
//! and `verificationVersion` all equal the request's. Two requests that
//! collide on `cacheKey` never see each other's receipt; the collision is
//! a miss.
//!
//! Entries expire lazily when looked up past their TTL. Writes beyond
//! capacity evict the least recently used entry.
//!
//! Concurrent misses are coalesced per submission: the key parts plus a
//! digest of the submitted proof material. A caller never receives the
//! outcome of verifying somebody else's proof.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use sigil_core::{sha256_bytes, ContentDigest, SigilError, SingleFlight};

use crate::receipt::{hash_receipt, VerificationReceipt};

pub const DEFAULT_CAPACITY: usize = 1024;
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// The fields that discriminate one verification from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKeyParts {
    pub bundle_hash: ContentDigest,
    pub zk_poseidon_hash: String,
    pub verification_version: String,
}

impl CacheKeyParts {
    pub fn new(
        bundle_hash: ContentDigest,
        zk_poseidon_hash: impl Into<String>,
        verification_version: impl Into<String>,
    ) -> Self {
        Self {
            bundle_hash,
            zk_poseidon_hash: zk_poseidon_hash.into(),
            verification_version: verification_version.into(),
        }
    }

    pub fn cache_key(&self) -> ContentDigest {
        cache_key(
            &self.bundle_hash,
            &self.zk_poseidon_hash,
            &self.verification_version,
        )
    }
}

/// `SHA256(bundleHash ++ zkPoseidonHash ++ verificationVersion)`, with the
/// bundle hash in lowercase hex.
pub fn cache_key(
    bundle_hash: &ContentDigest,
    zk_poseidon_hash: &str,
    verification_version: &str,
) -> ContentDigest {
    let mut buf = bundle_hash.to_hex().into_bytes();
    buf.extend_from_slice(zk_poseidon_hash.as_bytes());
    buf.extend_from_slice(verification_version.as_bytes());
    sha256_bytes(&buf)
}

/// A cached verification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub cache_key: ContentDigest,
    pub bundle_hash: ContentDigest,
    pub zk_poseidon_hash: String,
    pub verification_version: String,
    pub receipt: VerificationReceipt,
    pub receipt_hash: ContentDigest,
}

impl CacheEntry {
    /// Entry for a receipt, keyed by the receipt's own fields.
    pub fn from_receipt(receipt: VerificationReceipt) -> Result<Self, SigilError> {
        let parts = CacheKeyParts::new(
            receipt.bundle_hash,
            receipt.zk_poseidon_hash.clone(),
            receipt.verification_version.clone(),
        );
        Ok(Self {
            cache_key: parts.cache_key(),
            bundle_hash: parts.bundle_hash,
            zk_poseidon_hash: parts.zk_poseidon_hash,
            verification_version: parts.verification_version,
            receipt_hash: hash_receipt(&receipt)?,
            receipt,
        })
    }

    fn matches(&self, parts: &CacheKeyParts) -> bool {
        self.bundle_hash == parts.bundle_hash
            && self.zk_poseidon_hash == parts.zk_poseidon_hash
            && self.verification_version == parts.verification_version
    }
}

/// Whether [`VerificationCache::get_or_verify`] served from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit,
    Miss,
}

struct Slot {
    entry: CacheEntry,
    expires_at: Instant,
}

pub struct VerificationCache {
    entries: Mutex<LruCache<ContentDigest, Slot>>,
    ttl: Duration,
    flight: SingleFlight<(CacheKeyParts, ContentDigest), Result<CacheEntry, SigilError>>,
}

impl std::fmt::Debug for VerificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationCache")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Default for VerificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl VerificationCache {
    /// A cache holding at most `capacity` entries (minimum 1) for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            flight: SingleFlight::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lookup(&self, parts: &CacheKeyParts) -> Option<CacheEntry> {
        self.lookup_at(parts, Instant::now())
    }

    /// Look up `parts` as of `now`. Expired entries are dropped.
    pub fn lookup_at(&self, parts: &CacheKeyParts, now: Instant) -> Option<CacheEntry> {
        let key = parts.cache_key();
        let mut entries = self.entries.lock();
        let slot = entries.get(&key)?;
        if now >= slot.expires_at {
            entries.pop(&key);
            tracing::debug!(cache_key = %key.to_hex(), "verification cache entry expired");
            return None;
        }
        if !slot.entry.matches(parts) {
            tracing::warn!(cache_key = %key.to_hex(), "verification cache key collision; treating as miss");
            return None;
        }
        Some(slot.entry.clone())
    }

    pub fn put(&self, entry: CacheEntry) {
        self.put_at(entry, Instant::now());
    }

    /// Store `entry` under its `cache_key` as of `now`.
    pub fn put_at(&self, entry: CacheEntry, now: Instant) {
        let key = entry.cache_key;
        let slot = Slot {
            entry,
            expires_at: now + self.ttl,
        };
        if let Some((evicted, _)) = self.entries.lock().push(key, slot) {
            if evicted != key {
                tracing::debug!(cache_key = %evicted.to_hex(), "verification cache evicted LRU entry");
            }
        }
    }

    /// Serve `parts` from cache, or run `verify` and cache its receipt.
    ///
    /// `submission` is a digest of the proof material `verify` checks.
    /// Concurrent misses with the same parts and the same submission run
    /// `verify` once; different submissions each run their own. A receipt
    /// that does not describe `parts` is refused rather than cached.
    pub async fn get_or_verify<F, Fut>(
        &self,
        parts: &CacheKeyParts,
        submission: &ContentDigest,
        verify: F,
    ) -> Result<(CacheEntry, CacheStatus), SigilError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VerificationReceipt, SigilError>>,
    {
        if let Some(entry) = self.lookup(parts) {
            return Ok((entry, CacheStatus::Hit));
        }
        let entry = self
            .flight
            .run((parts.clone(), *submission), || async move {
                let receipt = verify().await?;
                let entry = CacheEntry::from_receipt(receipt)?;
                if !entry.matches(parts) {
                    return Err(SigilError::CryptoMismatch(
                        "receipt does not describe the requested verification".into(),
                    ));
                }
                self.put(entry.clone());
                Ok(entry)
            })
            .await?;
        Ok((entry, CacheStatus::Miss))
    }
}
