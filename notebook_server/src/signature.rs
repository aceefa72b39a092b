//! Webhook signature verification.
//!
//! The payment provider signs each delivery with a header of the form
//! `t=<unix>,v1=<hex>[,v1=<hex>...]`. The signature is HMAC-SHA256 over `"{t}.{body}"` keyed by
//! the shared webhook secret. Verification checks the timestamp freshness window and any of the
//! `v1` candidates in constant time.
//!
//! Every rejection maps onto the one opaque [`SignatureError`], so callers cannot leak which
//! check failed.
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sng_common::Secret;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the provider's signature.
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Maximum allowed skew between the signature timestamp and the server clock, in seconds.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Error)]
#[error("Invalid signature")]
pub struct SignatureError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignature {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

/// Parses the signature header. Unknown pairs are ignored; a missing timestamp or an empty
/// signature list is a rejection.
pub fn parse_signature_header(header: &str) -> Result<ParsedSignature, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim() {
            "t" => timestamp = value.trim().parse::<i64>().ok(),
            "v1" => signatures.push(value.trim().to_string()),
            _ => {},
        }
    }
    match (timestamp, signatures.is_empty()) {
        (Some(timestamp), false) if timestamp > 0 => Ok(ParsedSignature { timestamp, signatures }),
        _ => Err(SignatureError),
    }
}

/// Verifies the raw body against a parsed signature header.
///
/// `now` is the server's unix timestamp; deliveries older or newer than
/// [`TIMESTAMP_TOLERANCE_SECS`] are rejected before any MAC comparison.
pub fn verify_signature(
    body: &[u8],
    parsed: &ParsedSignature,
    secret: &Secret<String>,
    now: i64,
) -> Result<(), SignatureError> {
    if (now - parsed.timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(SignatureError);
    }
    for candidate in &parsed.signatures {
        let Ok(sig_bytes) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.reveal().as_bytes()).map_err(|_| SignatureError)?;
        mac.update(parsed.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        if mac.verify_slice(&sig_bytes).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError)
}
