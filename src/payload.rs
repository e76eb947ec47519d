use serde::{de::DeserializeOwned, Serialize};

use crate::{ApiClientError, Result};

/// Response body normalized by the client.
///
/// Bodies that parse as JSON become [`Payload::Json`]; anything else is kept
/// verbatim as [`Payload::Text`]. A body with no bytes is [`Payload::Empty`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
    Empty,
}

impl Payload {
    /// Returns the JSON value, if the body was JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the raw text, if the body was not JSON.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Converts into a JSON value. Text becomes a JSON string, empty becomes `null`.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => serde_json::Value::String(text),
            Self::Empty => serde_json::Value::Null,
        }
    }

    /// Deserializes the payload into a typed value.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_json())
            .map_err(|err| ApiClientError::Decode(format!("unexpected response shape: {err}")))
    }
}
