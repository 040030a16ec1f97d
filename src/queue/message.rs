//! Message definitions for the queue
//!
//! `Message` is the envelope stored in a topic's payload map, keyed by its
//! id. The id itself is what travels through the backlog and nextlog lists.
//!
//! Notes on fields:
//! - `id`: uuid v4 string, unique within a topic
//! - `payload`: either opaque bytes or a flat string map
//! - `created_at`: milliseconds since UNIX epoch, set by the producer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::{QueueError, Result};

pub type MessageId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Bytes(Vec<u8>),
    Fields(BTreeMap<String, String>),
}

impl Payload {
    /// Parse the JSON convenience form: a flat object. Strings are kept,
    /// numbers and booleans are stringified, anything else is rejected.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(object) = value else {
            return Err(QueueError::InvalidPayload(
                "expected a JSON object".to_string(),
            ));
        };

        let mut fields = BTreeMap::new();
        for (key, value) in object {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => {
                    return Err(QueueError::InvalidPayload(format!(
                        "field '{key}' is null"
                    )));
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(QueueError::InvalidPayload(format!(
                        "field '{key}' is nested; only flat string maps are supported"
                    )));
                }
            };
            fields.insert(key, value);
        }
        Ok(Payload::Fields(fields))
    }

    /// JSON view used by the CLI: fields become an object, bytes an array.
    pub fn to_json(&self) -> Value {
        match self {
            Payload::Fields(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            Payload::Bytes(bytes) => Value::from(bytes.clone()),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<BTreeMap<String, String>> for Payload {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Payload::Fields(fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub payload: Payload,
    pub created_at: i64,
}

impl Message {
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub(crate) fn decode(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }
}
