//! # sigil-receipt: Verification Receipts and Cache
//!
//! - [`receipt`]: the receipt record, its hash, and constant-time checks.
//! - [`cache`]: the LRU + TTL verification cache and its composite key.

pub mod cache;
pub mod receipt;

pub use cache::{
    cache_key, CacheEntry, CacheKeyParts, CacheStatus, VerificationCache, DEFAULT_CAPACITY,
    DEFAULT_TTL,
};
pub use receipt::{assert_receipt_hash_match, hash_receipt, VerificationReceipt, RECEIPT_MISMATCH};
