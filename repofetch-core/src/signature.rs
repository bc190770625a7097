//! `X-Hub-Signature-256` signing and verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body and
//! sends `sha256=<lowercase hex>`. Verification must run on the exact bytes
//! received, before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the `X-Hub-Signature-256` header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the header value GitHub would send for `payload`.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    // HMAC accepts keys of any length, including empty ones.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(payload);
    format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Check a claimed `sha256=<hex>` signature against `payload`.
///
/// The digest comparison goes through `Mac::verify_slice`, which compares in
/// constant time. A digest of the wrong length is rejected by `verify_slice`
/// without inspecting its contents. An empty secret never verifies.
pub fn verify_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    let Some(signature_hex) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };

    let signature_bytes = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };

    mac.update(payload);

    mac.verify_slice(&signature_bytes).is_ok()
}
