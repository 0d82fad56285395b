//! Slack request signing (`v0` HMAC-SHA256) verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{AppError, Result};

/// Header carrying the request timestamp.
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Header carrying the `v0=<hex>` signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Requests older or newer than this are rejected as replays.
pub const MAX_SKEW_SECONDS: i64 = 60 * 5;

/// Verify a signed slash command request body.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the timestamp is malformed or stale,
/// the signature is not `v0=<hex>`, or the digest does not match.
pub fn verify(secret: &str, timestamp: &str, signature: &str, body: &[u8], now_unix: i64) -> Result<()> {
    let sent_at: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| AppError::Unauthorized("invalid request timestamp".into()))?;
    if (now_unix - sent_at).abs() > MAX_SKEW_SECONDS {
        return Err(AppError::Unauthorized("request timestamp outside allowed skew".into()));
    }

    let Some(digest_hex) = signature.trim().strip_prefix("v0=") else {
        return Err(AppError::Unauthorized("signature must use v0=<hex> format".into()));
    };
    let expected = hex::decode(digest_hex)
        .map_err(|_| AppError::Unauthorized("signature digest is not hex".into()))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|err| AppError::Config(format!("invalid signing secret: {err}")))?;
    mac.update(b"v0:");
    mac.update(timestamp.trim().as_bytes());
    mac.update(b":");
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| AppError::Unauthorized("signature verification failed".into()))
}

/// Compute the `v0=<hex>` signature for a body.
///
/// # Errors
///
/// Returns `AppError::Config` if the secret cannot key the HMAC.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|err| AppError::Config(format!("invalid signing secret: {err}")))?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}
