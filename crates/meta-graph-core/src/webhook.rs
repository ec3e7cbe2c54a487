//! Webhook crypto utilities.
//!
//! The platform signs every webhook delivery with HMAC-SHA256 over the exact
//! raw request body, carried in the `X-Hub-Signature-256` header, and
//! verifies endpoint ownership with a `hub.challenge` handshake. Signature
//! comparison is constant-time to prevent timing attacks. Secrets and
//! signature values are never logged.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::ValidationError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature on webhook deliveries.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Validate a webhook payload signature.
///
/// Computes HMAC-SHA256 over `payload` with `app_secret` and compares it in
/// constant time against the `sha256=<hex>` value in `signature_header`.
///
/// # Returns
///
/// * `Ok(true)` — signature matches
/// * `Ok(false)` — signature does not match (tampered payload or wrong
///   secret); reject the delivery with 401
/// * `Err` — the header is malformed (missing prefix, invalid hex)
///
/// # Examples
///
/// ```
/// use meta_graph_core::webhook::{sign_payload, verify_signature};
///
/// let payload = br#"{"object":"whatsapp_business_account"}"#;
/// let header = sign_payload(payload, "app-secret").unwrap();
///
/// assert!(verify_signature(payload, &header, "app-secret").unwrap());
/// assert!(!verify_signature(b"tampered", &header, "app-secret").unwrap());
/// ```
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    app_secret: &str,
) -> Result<bool, ValidationError> {
    let provided = parse_signature(signature_header)?;
    let expected = compute_signature(payload, app_secret)?;
    Ok(constant_time_eq(&provided, &expected))
}

/// Compute the `sha256=<hex>` signature header value for a payload.
///
/// The counterpart of [`verify_signature`], useful for tests and for
/// signing outbound callbacks.
pub fn sign_payload(payload: &[u8], app_secret: &str) -> Result<String, ValidationError> {
    let signature = compute_signature(payload, app_secret)?;
    Ok(format!("{SIGNATURE_PREFIX}{}", hex::encode(signature)))
}

/// Answer the webhook subscription handshake.
///
/// Returns the challenge to echo back with a 200 iff `mode` is
/// `"subscribe"` and `verify_token` matches the configured token; `None`
/// means the caller should respond 403.
///
/// # Examples
///
/// ```
/// use meta_graph_core::webhook::subscription_challenge;
///
/// assert_eq!(
///     subscription_challenge("subscribe", "my-token", "1158201444", "my-token"),
///     Some("1158201444")
/// );
/// assert_eq!(
///     subscription_challenge("subscribe", "wrong", "1158201444", "my-token"),
///     None
/// );
/// ```
pub fn subscription_challenge<'a>(
    mode: &str,
    verify_token: &str,
    challenge: &'a str,
    expected_token: &str,
) -> Option<&'a str> {
    if mode == "subscribe" && constant_time_eq(verify_token.as_bytes(), expected_token.as_bytes()) {
        Some(challenge)
    } else {
        None
    }
}

fn parse_signature(signature_header: &str) -> Result<Vec<u8>, ValidationError> {
    let hex_signature = signature_header.strip_prefix(SIGNATURE_PREFIX).ok_or_else(|| {
        ValidationError::InvalidSignatureFormat {
            message: format!(
                "signature must start with '{}', got: '{}'",
                SIGNATURE_PREFIX,
                signature_header.chars().take(10).collect::<String>()
            ),
        }
    })?;

    hex::decode(hex_signature).map_err(|e| ValidationError::InvalidSignatureFormat {
        message: format!("invalid hex encoding in signature: {e}"),
    })
}

fn compute_signature(payload: &[u8], app_secret: &str) -> Result<Vec<u8>, ValidationError> {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes()).map_err(|e| {
        ValidationError::InvalidSignatureFormat {
            message: format!("failed to initialize HMAC: {e}"),
        }
    })?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    // Length is not secret; only the contents need constant-time handling.
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
