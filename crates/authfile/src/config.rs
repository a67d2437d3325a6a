use serde::Deserialize;

/// Options for opening a single-file store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreOptions {
    /// Serialize mutate-and-write sequences so concurrent `set`/`save_creds`
    /// calls cannot overwrite a newer file with an older snapshot.
    /// Off by default: concurrent writes race and the last one to finish wins.
    #[serde(default)]
    pub serialize_writes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = StoreOptions::default();
        assert!(!options.serialize_writes);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: StoreOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.serialize_writes);

        let options: StoreOptions = serde_json::from_str(r#"{"serialize_writes": true}"#).unwrap();
        assert!(options.serialize_writes);
    }
}
