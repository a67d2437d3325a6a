//! Command handlers. Each returns the JSON document printed on stdout.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use authfile::store::{data_set, is_truthy};
use authfile::{Category, SignalKeyStore, SingleFileAuthState};
use serde_json::{json, Value};
use tracing::info;

/// Persist the (possibly freshly generated) credentials.
pub async fn init(store: &SingleFileAuthState) -> Result<Value> {
    store
        .save_creds()
        .await
        .with_context(|| format!("failed to save {}", store.path().display()))?;

    let creds = store.creds().await;
    info!(path = %store.path().display(), "auth state initialized");
    Ok(json!({
        "path": store.path().display().to_string(),
        "registrationId": creds.registration_id(),
        "registered": creds.registered(),
    }))
}

/// Summary of credentials and key counts per category.
pub async fn inspect(store: &SingleFileAuthState) -> Result<Value> {
    let state = store.snapshot().await;
    let typed = state.creds.as_typed();

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for composite in state.keys.keys() {
        let bucket = match Category::split_composite(composite) {
            Some((category, _)) => category.to_string(),
            None => "other".to_string(),
        };
        *counts.entry(bucket).or_default() += 1;
    }

    Ok(json!({
        "path": store.path().display().to_string(),
        "registrationId": state.creds.registration_id(),
        "registered": state.creds.registered(),
        "me": state.creds.me_id(),
        "platform": typed.and_then(|creds| creds.platform.as_deref()),
        "nextPreKeyId": typed.map(|creds| creds.next_pre_key_id),
        "complete": typed.is_some(),
        "keys": counts,
    }))
}

pub async fn get(store: &SingleFileAuthState, category: &str, ids: &[String]) -> Result<Value> {
    let found = store.keys().get(&Category::from(category), ids).await;
    let ordered: BTreeMap<_, _> = found.into_iter().collect();
    Ok(serde_json::to_value(ordered)?)
}

/// Store one value. A falsy value (`null`, `false`, `0`, `""`) deletes instead.
pub async fn set(
    store: &SingleFileAuthState,
    category: &str,
    id: &str,
    raw_value: &str,
) -> Result<Value> {
    let value: Value = serde_json::from_str(raw_value)
        .with_context(|| format!("value for {category}-{id} is not valid JSON"))?;
    let stored = is_truthy(&value);

    store
        .keys()
        .set(data_set(Category::from(category), [(id, Some(value))]))
        .await
        .with_context(|| format!("failed to write {}", store.path().display()))?;

    Ok(json!({ "stored": stored }))
}

pub async fn delete(store: &SingleFileAuthState, category: &str, ids: &[String]) -> Result<Value> {
    let category = Category::from(category);
    let existing = store.keys().get(&category, ids).await.len();

    store
        .keys()
        .set(data_set(category, ids.iter().map(|id| (id.clone(), None))))
        .await
        .with_context(|| format!("failed to write {}", store.path().display()))?;

    Ok(json!({ "removed": existing }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn init_writes_file() {
        let dir = TempDir::new().unwrap();
        let store = SingleFileAuthState::open(dir.path()).await.unwrap();
        let out = init(&store).await.unwrap();
        assert!(store.path().is_file());
        assert_eq!(out["registered"], false);
    }

    #[tokio::test]
    async fn set_get_delete_cycle() {
        let dir = TempDir::new().unwrap();
        let store = SingleFileAuthState::open(dir.path()).await.unwrap();

        let out = set(&store, "session", "42.0", r#"{"record":"abc"}"#).await.unwrap();
        assert_eq!(out["stored"], true);

        let out = get(&store, "session", &ids(&["42.0", "missing"])).await.unwrap();
        assert_eq!(out, json!({ "42.0": { "record": "abc" } }));

        let out = delete(&store, "session", &ids(&["42.0", "missing"])).await.unwrap();
        assert_eq!(out["removed"], 1);
        let out = get(&store, "session", &ids(&["42.0"])).await.unwrap();
        assert_eq!(out, json!({}));
    }

    #[tokio::test]
    async fn set_falsy_reports_not_stored() {
        let dir = TempDir::new().unwrap();
        let store = SingleFileAuthState::open(dir.path()).await.unwrap();
        let out = set(&store, "pre-key", "1", "\"\"").await.unwrap();
        assert_eq!(out["stored"], false);
    }

    #[tokio::test]
    async fn set_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let store = SingleFileAuthState::open(dir.path()).await.unwrap();
        assert!(set(&store, "pre-key", "1", "{oops").await.is_err());
    }

    #[tokio::test]
    async fn inspect_counts_by_category() {
        let dir = TempDir::new().unwrap();
        let store = SingleFileAuthState::open(dir.path()).await.unwrap();
        set(&store, "pre-key", "1", "{\"a\":1}").await.unwrap();
        set(&store, "pre-key", "2", "{\"a\":2}").await.unwrap();
        set(&store, "sender-key-memory", "g@g.us", "{\"u\":true}").await.unwrap();
        set(&store, "custom", "x", "1").await.unwrap();

        let out = inspect(&store).await.unwrap();
        assert_eq!(out["keys"]["pre-key"], 2);
        assert_eq!(out["keys"]["sender-key-memory"], 1);
        assert_eq!(out["keys"]["other"], 1);
        assert_eq!(out["me"], Value::Null);
        assert_eq!(out["complete"], true);
    }

    #[tokio::test]
    async fn inspect_partial_creds() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("creds.json"),
            r#"{"creds":{"registrationId":9,"me":{"id":"1@s.whatsapp.net"}},"keys":{}}"#,
        )
        .unwrap();
        let store = SingleFileAuthState::open(dir.path()).await.unwrap();

        let out = inspect(&store).await.unwrap();
        assert_eq!(out["registrationId"], 9);
        assert_eq!(out["me"], "1@s.whatsapp.net");
        assert_eq!(out["complete"], false);
        assert_eq!(out["nextPreKeyId"], Value::Null);
    }

    #[tokio::test]
    async fn get_decodes_sync_keys() {
        let dir = TempDir::new().unwrap();
        let store = SingleFileAuthState::open(dir.path()).await.unwrap();
        set(
            &store,
            "app-state-sync-key",
            "AAAA",
            r#"{"keyData":{"type":"Buffer","data":"AQI="},"timestamp":"12","extra":1}"#,
        )
        .await
        .unwrap();

        let out = get(&store, "app-state-sync-key", &ids(&["AAAA"])).await.unwrap();
        assert_eq!(
            out,
            json!({ "AAAA": { "keyData": { "type": "Buffer", "data": "AQI=" }, "timestamp": 12 } })
        );
    }
}
