//! App-state sync-key records.
//!
//! Sync keys are stored in their plain object form. On read they are turned
//! into [`AppStateSyncKeyData`] with the same leniency as protobuf object
//! conversion: bytes may be a tagged buffer, a base64 string or a number
//! array; integers may be numbers, numeric strings or `{low, high}` longs.
//! Ill-typed fields come back as `None` instead of failing the read.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::buffer_json::{self, Bytes};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSyncKeyFingerprint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_index: Option<u32>,
    #[serde(default)]
    pub device_indexes: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSyncKeyData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<AppStateSyncKeyFingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl AppStateSyncKeyData {
    /// Build the structured record from its stored object form.
    pub fn from_object(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        Self {
            key_data: field(obj, "keyData").and_then(bytes_field).map(Bytes),
            fingerprint: field(obj, "fingerprint")
                .and_then(Value::as_object)
                .map(AppStateSyncKeyFingerprint::from_map),
            timestamp: field(obj, "timestamp").and_then(long_field),
        }
    }

    /// The stored object form, with key bytes in the tagged buffer encoding.
    pub fn to_object(&self) -> Value {
        let mut obj = Map::new();
        if let Some(key_data) = &self.key_data {
            obj.insert("keyData".into(), buffer_json::encode(key_data.as_slice()));
        }
        if let Some(fp) = &self.fingerprint {
            let mut fp_obj = Map::new();
            if let Some(raw_id) = fp.raw_id {
                fp_obj.insert("rawId".into(), raw_id.into());
            }
            if let Some(current_index) = fp.current_index {
                fp_obj.insert("currentIndex".into(), current_index.into());
            }
            fp_obj.insert("deviceIndexes".into(), fp.device_indexes.clone().into());
            obj.insert("fingerprint".into(), Value::Object(fp_obj));
        }
        if let Some(timestamp) = self.timestamp {
            obj.insert("timestamp".into(), timestamp.into());
        }
        Value::Object(obj)
    }
}

impl AppStateSyncKeyFingerprint {
    fn from_map(obj: &Map<String, Value>) -> Self {
        Self {
            raw_id: field(obj, "rawId").and_then(uint32_field),
            current_index: field(obj, "currentIndex").and_then(uint32_field),
            device_indexes: field(obj, "deviceIndexes")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(uint32_field).collect())
                .unwrap_or_default(),
        }
    }
}

/// Null counts as unset.
fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name).filter(|v| !v.is_null())
}

fn bytes_field(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => STANDARD.decode(s).ok(),
        Value::Array(items) => buffer_json::byte_array(items),
        other => buffer_json::decode(other),
    }
}

fn uint32_field(value: &Value) -> Option<u32> {
    long_field(value).map(|n| n as u32)
}

fn long_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u as i64))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => {
            let low = obj.get("low")?.as_i64()?;
            let high = obj.get("high").and_then(Value::as_i64).unwrap_or(0);
            Some((high << 32) | (low & 0xffff_ffff))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_stored_object_form() {
        let stored = json!({
            "keyData": { "type": "Buffer", "data": "AQIDBA==" },
            "fingerprint": { "rawId": 7, "currentIndex": 2, "deviceIndexes": [0, 3] },
            "timestamp": 1_700_000_000_000_i64,
        });
        let record = AppStateSyncKeyData::from_object(&stored);
        assert_eq!(record.key_data.unwrap().as_slice(), &[1, 2, 3, 4]);
        let fp = record.fingerprint.unwrap();
        assert_eq!(fp.raw_id, Some(7));
        assert_eq!(fp.current_index, Some(2));
        assert_eq!(fp.device_indexes, vec![0, 3]);
        assert_eq!(record.timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn accepts_base64_string_and_long_object() {
        let stored = json!({
            "keyData": "AQID",
            "timestamp": { "low": 5, "high": 1, "unsigned": false },
        });
        let record = AppStateSyncKeyData::from_object(&stored);
        assert_eq!(record.key_data.unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(record.timestamp, Some((1_i64 << 32) | 5));
    }

    #[test]
    fn numeric_string_timestamp() {
        let record = AppStateSyncKeyData::from_object(&json!({ "timestamp": "42" }));
        assert_eq!(record.timestamp, Some(42));
    }

    #[test]
    fn ill_typed_fields_are_unset() {
        let record = AppStateSyncKeyData::from_object(&json!({
            "keyData": true,
            "fingerprint": "nope",
            "timestamp": [],
            "unrelated": 1,
        }));
        assert_eq!(record, AppStateSyncKeyData::default());
        assert_eq!(AppStateSyncKeyData::from_object(&json!(3)), AppStateSyncKeyData::default());
    }

    #[test]
    fn object_form_decodes_back() {
        let record = AppStateSyncKeyData {
            key_data: Some(Bytes(vec![8; 32])),
            fingerprint: Some(AppStateSyncKeyFingerprint {
                raw_id: Some(1),
                current_index: None,
                device_indexes: vec![1, 2],
            }),
            timestamp: Some(99),
        };
        assert_eq!(AppStateSyncKeyData::from_object(&record.to_object()), record);
    }
}
