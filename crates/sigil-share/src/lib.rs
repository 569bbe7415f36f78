//! # sigil-share: Share Links
//!
//! Packs a canonical bundle into a payload short enough for a URL and
//! unpacks it again under strict byte ceilings. See [`codec`] for the wire
//! forms and [`link`] for URL handling.

pub mod codec;
pub mod error;
pub mod link;

pub use codec::{
    decode, encode, ShareCodec, ShareFormat, ShareLimits, SharePayload, COMPRESSED_PREFIX,
    DEFAULT_MAX_ENCODED_BYTES, DEFAULT_MAX_INFLATED_BYTES,
};
pub use error::ShareError;
pub use link::{decode_share_url, try_decode_share_url, LEGACY_PARAMS, PAYLOAD_PARAM};
