//! Webhook body signing and verification.
//!
//! The platform signs each delivery with HMAC-SHA256 keyed by the channel
//! secret and sends the base64-encoded digest in the signature header.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the base64-encoded HMAC-SHA256 signature for a body.
#[must_use]
pub fn sign(channel_secret: &str, body: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts keys of any length"));
    mac.update(body.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Verify a webhook delivery against its signature header value.
#[must_use]
pub fn verify(channel_secret: &str, body: &str, signature_b64: &str) -> bool {
    let expected = match base64::engine::general_purpose::STANDARD.decode(signature_b64) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(channel_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body.as_bytes());
    constant_time_eq(&mac.finalize().into_bytes(), &expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
