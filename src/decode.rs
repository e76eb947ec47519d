use reqwest::StatusCode;
use serde_json::Value;

use crate::Payload;

/// Body fields consulted, in order, for an error message.
const MESSAGE_FIELDS: [&str; 3] = ["error", "message", "detail"];

/// Normalizes a response body read as text.
pub(crate) fn parse_body(text: String) -> Payload {
    if text.is_empty() {
        return Payload::Empty;
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Payload::Json(value),
        Err(_) => Payload::Text(text),
    }
}

/// Picks the message for a failed response.
///
/// JSON objects are searched for `error`, `message`, then `detail`. Otherwise
/// the raw body is used, and an empty body falls back to the status reason.
pub(crate) fn error_message(payload: &Payload, raw: &str, status: StatusCode) -> String {
    if let Some(Value::Object(fields)) = payload.as_json() {
        let found = MESSAGE_FIELDS
            .iter()
            .filter_map(|field| fields.get(*field))
            .find_map(message_from_field);
        if let Some(message) = found {
            return message;
        }
    }

    if !raw.trim().is_empty() {
        return raw.to_owned();
    }

    status
        .canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Falsy fields (`null`, `false`, `0`, `""`) are passed over.
fn message_from_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
