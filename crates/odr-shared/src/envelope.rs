//! Response envelope of the modulator web API.
//!
//! Success: `{"status": "ok", "data": ...}`. Failure: any other status, with the reason in
//! `reason` or in a string `data`. The failure classification lives here so it can be checked
//! without a network.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;

/// Longest body excerpt quoted in an error message.
const MAX_BODY_EXCERPT: usize = 200;

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
}

impl Envelope {
    fn failure_reason(self, http_status: u16) -> String {
        if let Some(reason) = self.reason.filter(|r| !r.is_empty()) {
            return reason;
        }
        match self.data {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Null) | None => format!("Device reported status '{}' (HTTP {})", self.status, http_status),
            Some(other) => other.to_string(),
        }
    }
}

/// Decode one response body into the `data` payload or a classified failure.
///
/// - 2xx with an `ok` envelope: the payload (`null` when absent)
/// - any non-`ok` envelope: `Device(reason)`
/// - 2xx without a parseable envelope: `Unreachable`
/// - non-2xx without a parseable envelope: `Device(body or HTTP code)`
pub fn decode(http_status: u16, body: &str) -> Result<Value, ClientError> {
    let http_ok = (200..300).contains(&http_status);

    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if envelope.status == "ok" && http_ok => Ok(envelope.data.unwrap_or(Value::Null)),
        Ok(envelope) => Err(ClientError::Device(envelope.failure_reason(http_status))),
        Err(e) if http_ok => Err(ClientError::Unreachable(format!("malformed response: {}", e))),
        Err(_) => {
            let text = body.trim();
            if text.is_empty() {
                Err(ClientError::Device(format!("HTTP {}", http_status)))
            } else {
                Err(ClientError::Device(excerpt(text)))
            }
        }
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= MAX_BODY_EXCERPT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_BODY_EXCERPT).collect();
        format!("{}...", cut)
    }
}
