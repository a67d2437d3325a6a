use authfile::StoreOptions;
use serde::Deserialize;

/// CLI configuration, loaded from a TOML file.
#[derive(Debug, Deserialize)]
pub struct CliConfig {
    /// Session path: a `*.json` file, or a directory holding `creds.json`.
    #[serde(default = "default_session_path")]
    pub session_path: String,

    /// Store options.
    #[serde(default)]
    pub store: StoreOptions,
}

fn default_session_path() -> String {
    "auth_info".into()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            session_path: default_session_path(),
            store: StoreOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = CliConfig::default();
        assert_eq!(config.session_path, "auth_info");
        assert!(!config.store.serialize_writes);
    }

    #[test]
    fn config_toml_deserialization() {
        let toml = r#"
            session_path = "/var/lib/bot/session.json"

            [store]
            serialize_writes = true
        "#;
        let config: CliConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.session_path, "/var/lib/bot/session.json");
        assert!(config.store.serialize_writes);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.session_path, "auth_info");
        assert!(!config.store.serialize_writes);
    }
}
