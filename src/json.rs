//! Raw JSON payload codec.
//!
//! [`JsonText`] carries an encoded JSON document verbatim, compatible with
//! `varchar`, `text`, `json` and `jsonb` columns. Decoding stores whatever
//! the server sent without validation; encoding checks that the payload is a
//! syntactically complete JSON document before letting it onto the wire.
//!
//! [`JsonText`] also behaves like a raw JSON message under serde: it
//! serializes as its payload without re-encoding and deserializes by
//! capturing the raw text of the value, so a stored document can be embedded
//! in or extracted from a larger document as-is. Absent payloads map to JSON
//! `null` through the usual `Option` handling.

use std::fmt;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::{FromPg, ToPg, TypeError, WireValue};

/// A raw encoded JSON value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonText(pub Vec<u8>);

impl JsonText {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }
}

impl fmt::Display for JsonText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for JsonText {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for JsonText {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for JsonText {
    fn from(b: Vec<u8>) -> Self {
        Self(b)
    }
}

impl serde::Serialize for JsonText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = std::str::from_utf8(&self.0).map_err(S::Error::custom)?;
        let raw = RawValue::from_string(s.to_owned()).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for JsonText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Ok(JsonText(raw.get().as_bytes().to_vec()))
    }
}

impl ToPg for JsonText {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        // Well-formedness only: the payload must parse as one complete JSON
        // document. Anything about its meaning is the caller's business.
        serde_json::from_slice::<serde_json::Value>(&self.0).map_err(|e| {
            TypeError::InvalidData(format!(
                "JsonText: invalid json {:?}: {e}",
                String::from_utf8_lossy(&self.0)
            ))
        })?;
        Ok(WireValue::Bytes(self.0.clone()))
    }
}

impl FromPg for JsonText {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        // stored verbatim, no validation on read
        match value {
            WireValue::Null => Err(TypeError::UnexpectedNull),
            WireValue::Bytes(b) => Ok(JsonText(b.clone())),
            WireValue::Text(s) => Ok(JsonText(s.as_bytes().to_vec())),
        }
    }
}
