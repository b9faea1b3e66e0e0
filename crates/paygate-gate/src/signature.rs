//! HMAC signature verification over the raw request body.
//!
//! The provider signs `"{timestamp}.{raw body}"` with HMAC-SHA256 and
//! sends `t=<unix seconds>,v1=<hex>` (possibly with several `v1` entries
//! during secret rotation). Verification must run over the exact wire
//! bytes: re-serializing a parsed body changes whitespace and key order
//! and breaks the MAC.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a signature was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature header was not present on the request.
    #[error("missing signature header")]
    Missing,

    /// The header did not follow the `t=...,v1=...` scheme.
    #[error("malformed signature header: {0}")]
    Malformed(String),

    /// The signed timestamp is outside the configured tolerance.
    #[error("signature timestamp outside tolerance")]
    Timestamp,

    /// No candidate signature matched the recomputed MAC.
    #[error("signature mismatch")]
    Mismatch,
}

/// Verifies `header` against the raw body and shared secret.
///
/// # Errors
///
/// Returns a [`SignatureError`] describing the first check that failed:
/// header parsing, timestamp tolerance, then the constant-time MAC
/// comparison.
pub fn verify_signature(
    raw_body: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let (timestamp, candidates) = parse_header(header)?;

    let skew = (now.timestamp() - timestamp).unsigned_abs();
    if skew > tolerance.as_secs() {
        return Err(SignatureError::Timestamp);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignatureError::Malformed(format!("unusable secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    // verify_slice is constant-time; try each rotation candidate.
    let matched = candidates.iter().any(|candidate| {
        hex::decode(candidate)
            .is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });
    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::Malformed(format!("bad timestamp: {value}")))?;
                timestamp = Some(parsed);
            }
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| SignatureError::Malformed("no timestamp entry".into()))?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed("no v1 signature entry".into()));
    }
    Ok((timestamp, candidates))
}

/// Computes the signature header a provider would send for `raw_body` at
/// `timestamp`. Used by tests and delivery simulators.
///
/// # Panics
///
/// Never in practice: HMAC-SHA256 accepts keys of any length.
#[must_use]
pub fn signature_header(secret: &str, timestamp: i64, raw_body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
