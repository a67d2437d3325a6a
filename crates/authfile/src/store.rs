//! Key store facade consumed by the protocol client.
//!
//! Values travel as JSON. Byte buffers inside them use the tagged form from
//! [`crate::buffer_json`], so whatever a client stores comes back unchanged.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::namespace::Category;
use crate::sync_key::AppStateSyncKeyData;

/// A value returned by [`SignalKeyStore::get`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalKeyValue {
    /// Stored value, returned as-is.
    Json(Value),
    /// Decoded `app-state-sync-key` record.
    AppStateSyncKey(AppStateSyncKeyData),
}

impl SignalKeyValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            SignalKeyValue::Json(v) => Some(v),
            SignalKeyValue::AppStateSyncKey(_) => None,
        }
    }

    pub fn as_app_state_sync_key(&self) -> Option<&AppStateSyncKeyData> {
        match self {
            SignalKeyValue::AppStateSyncKey(k) => Some(k),
            SignalKeyValue::Json(_) => None,
        }
    }
}

/// Result of a `get`: id -> value, for ids that have an entry.
pub type SignalDataMap = HashMap<String, SignalKeyValue>;

/// Input of a `set`: category -> id -> value. A falsy or `None` value removes the entry.
pub type SignalDataSet = BTreeMap<Category, BTreeMap<String, Option<Value>>>;

#[async_trait::async_trait]
pub trait SignalKeyStore: Send + Sync {
    /// Look up `ids` in `category`. Missing ids are left out of the result.
    async fn get(&self, category: &Category, ids: &[String]) -> SignalDataMap;

    /// Apply every entry of `data`, then persist.
    async fn set(&self, data: SignalDataSet) -> Result<()>;
}

/// JavaScript truthiness of a stored value. Falsy values mean "delete".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Convenience builder for a single-category `set`.
pub fn data_set<I, K>(category: Category, entries: I) -> SignalDataSet
where
    I: IntoIterator<Item = (K, Option<Value>)>,
    K: Into<String>,
{
    let mut set = SignalDataSet::new();
    set.insert(
        category,
        entries.into_iter().map(|(id, v)| (id.into(), v)).collect(),
    );
    set
}
