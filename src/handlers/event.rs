//! Inbound event envelope decoding and loose field extraction.
//!
//! Events may arrive wrapped in a transport envelope whose `data` key
//! holds a base64-encoded JSON payload. Events without a `data` key are
//! already the logical payload.

use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;

/// Unwrap the transport envelope if present. Any decode failure is
/// reported as a message for a validation-error response.
pub fn decode_envelope(event: &Value) -> Result<Value, String> {
    let Some(data) = event.get("data") else {
        return Ok(event.clone());
    };
    let encoded = data
        .as_str()
        .ok_or_else(|| "envelope data must be a base64 string".to_string())?;
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| format!("envelope data is not valid base64: {e}"))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("envelope payload is not valid JSON: {e}"))
}

/// Best-effort string field, empty when absent or not a string. Used to
/// echo identifiers back on validation failures.
pub(crate) fn str_field(event: &Value, key: &str) -> String {
    event
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn i64_field(event: &Value, key: &str) -> Option<i64> {
    event.get(key).and_then(Value::as_i64)
}
