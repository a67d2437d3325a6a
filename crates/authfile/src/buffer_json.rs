//! Buffer-aware JSON codec.
//!
//! Byte buffers are written as `{"type":"Buffer","data":"<base64>"}` so files
//! stay interoperable with other clients of the same session format. Reading
//! also accepts the array form (`"data":[1,2,3]`) and the legacy
//! `{"buffer":true,"value":...}` tag.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use zeroize::Zeroize;

const BUFFER_TAG: &str = "Buffer";

/// Owned byte buffer carried through JSON in the tagged form.
#[derive(Clone, Default, PartialEq, Eq, Hash, Zeroize)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes({})", STANDARD.encode(&self.0))
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Buffer", 2)?;
        s.serialize_field("type", BUFFER_TAG)?;
        s.serialize_field("data", &STANDARD.encode(&self.0))?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode(&value)
            .map(Bytes)
            .ok_or_else(|| D::Error::custom("expected a tagged buffer object"))
    }
}

/// Encode raw bytes into the tagged JSON form.
pub fn encode(bytes: &[u8]) -> Value {
    json!({ "type": BUFFER_TAG, "data": STANDARD.encode(bytes) })
}

/// Decode a tagged buffer object. Returns `None` for anything that is not
/// tagged as a buffer or whose payload is malformed.
pub fn decode(value: &Value) -> Option<Vec<u8>> {
    let obj = value.as_object()?;
    let tagged = obj.get("type").and_then(Value::as_str) == Some(BUFFER_TAG)
        || obj.get("buffer").and_then(Value::as_bool) == Some(true);
    if !tagged {
        return None;
    }

    match obj.get("data").or_else(|| obj.get("value")) {
        Some(Value::String(s)) => STANDARD.decode(s).ok(),
        Some(Value::Array(items)) => byte_array(items),
        // A tag without payload revives to an empty buffer.
        Some(Value::Null) | None => Some(Vec::new()),
        Some(_) => None,
    }
}

pub(crate) fn byte_array(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}
