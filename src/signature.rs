//! Webhook signature verification.
//!
//! LINE signs every webhook request with the channel secret: the
//! `X-Line-Signature` header carries the base64-encoded HMAC-SHA256 of the
//! request body. Verification must run over the exact bytes received,
//! before any JSON decoding, since re-encoding changes whitespace.
//!
//! ```rust
//! use line_webhook_rs::signature::{sign, verify_signature};
//!
//! let body = br#"{"destination":"U0","events":[]}"#;
//! let header = sign(body, "channel_secret");
//!
//! assert!(verify_signature(body, &header, "channel_secret"));
//! assert!(!verify_signature(body, &header, "another_secret"));
//! ```

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::WebhookError;

/// Name of the header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

type HmacSha256 = Hmac<Sha256>;

/// The channel secret used as the HMAC key.
#[derive(PartialEq, Clone)]
pub struct ChannelSecret(pub String);

impl std::fmt::Debug for ChannelSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChannelSecret(***)")
    }
}

impl From<&str> for ChannelSecret {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ChannelSecret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Computes the `X-Line-Signature` value for `body`.
pub fn sign(body: &[u8], secret: &str) -> String {
    digest(body, secret)
        .map(|mac| BASE64.encode(mac))
        .unwrap_or_default()
}

/// Returns `true` when `signature` is the base64 HMAC-SHA256 of `body`
/// keyed by `secret`. An empty signature never verifies.
pub fn verify_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let expected = sign(body, secret);
    if signature.is_empty() || expected.is_empty() {
        return false;
    }

    // Length is not secret; ct_eq handles unequal lengths as a mismatch.
    signature.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Extracts the signature header from `headers` and verifies `body` against it.
pub fn check_signature(
    secret: &ChannelSecret,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or(WebhookError::InvalidSignature("missing X-Line-Signature header"))?
        .to_str()
        .map_err(|_| WebhookError::InvalidSignature("unreadable X-Line-Signature header"))?;

    if verify_signature(body, signature, &secret.0) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature(
            "signature mismatch; check the channel secret or whether the body was altered in transit",
        ))
    }
}

fn digest(body: &[u8], secret: &str) -> Option<Vec<u8>> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(mac.finalize().into_bytes().to_vec())
}
