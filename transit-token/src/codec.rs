use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{json, Value};
use tracing::debug;

use crate::claims::DecodedClaims;
use crate::error::TokenError;

const BEARER_PREFIX: &str = "Bearer ";

/// Decode a bearer token's payload into [`DecodedClaims`].
///
/// The token must have three `.`-separated segments. Only the payload segment
/// is read; the signature is not checked.
///
/// # Arguments
///
/// * `token` - The raw token, optionally prefixed with `Bearer `
///
/// # Returns
///
/// The decoded claims, or a [`TokenError`] if the token is structurally invalid
pub fn decode_claims(token: &str) -> Result<DecodedClaims, TokenError> {
    let token = token.trim();
    let token = token.strip_prefix(BEARER_PREFIX).unwrap_or(token);

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }
    if segments[1].is_empty() {
        return Err(TokenError::malformed("empty payload segment"));
    }

    let payload = decode_segment(segments[1])?;
    match serde_json::from_slice::<Value>(&payload)? {
        Value::Object(map) => Ok(DecodedClaims::from_payload(map)),
        other => {
            debug!(kind = json_kind(&other), "token payload is not an object");
            Err(TokenError::malformed("payload is not a JSON object"))
        }
    }
}

/// Decode a single base64url segment.
///
/// Padding is optional and the standard alphabet is tolerated.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    Ok(URL_SAFE_NO_PAD.decode(normalized)?)
}

/// Build an unsigned token carrying `payload`.
///
/// The header declares `alg: none` and the signature segment is empty. Useful
/// for fixtures and local tooling; nothing in this workspace verifies it.
pub fn encode_claims(payload: &Value) -> String {
    let header = json!({ "alg": "none", "typ": "JWT" });
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
