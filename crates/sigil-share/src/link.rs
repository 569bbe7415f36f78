//! # Share URLs
//!
//! Current links carry the payload in `?p=`. Older links used `?r=` or
//! `?receipt=` with the legacy uncompressed form.

use serde::Serialize;
use url::Url;

use crate::codec::{ShareCodec, SharePayload};
use crate::error::ShareError;

/// Query parameter of current share links.
pub const PAYLOAD_PARAM: &str = "p";
/// Query parameters of legacy share links, checked in order.
pub const LEGACY_PARAMS: [&str; 2] = ["r", "receipt"];

impl ShareCodec {
    /// Build a share URL by appending `?p=<payload>` to `base`.
    pub fn share_url(&self, base: &Url, bundle: &impl Serialize) -> Result<Url, ShareError> {
        let payload = self.encode(bundle)?;
        let mut url = base.clone();
        url.query_pairs_mut().append_pair(PAYLOAD_PARAM, &payload);
        Ok(url)
    }

    /// Decode the payload carried by a share URL.
    pub fn decode_url(&self, url: &str) -> Result<SharePayload, ShareError> {
        let url = Url::parse(url.trim()).map_err(|e| ShareError::Decode(format!("url: {e}")))?;
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };
        if let Some(payload) = param(PAYLOAD_PARAM) {
            return self.decode(&payload);
        }
        for name in LEGACY_PARAMS {
            if let Some(payload) = param(name) {
                return self.decode_legacy(&payload);
            }
        }
        Err(ShareError::Decode("url carries no share payload".into()))
    }
}

/// Decode the payload of a share URL with default limits.
pub fn decode_share_url(url: &str) -> Result<SharePayload, ShareError> {
    ShareCodec::default().decode_url(url)
}

/// Lenient form of [`decode_share_url`] for link previews: any failure is
/// `None`.
pub fn try_decode_share_url(url: &str) -> Option<SharePayload> {
    match decode_share_url(url) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring undecodable share url");
            None
        }
    }
}
