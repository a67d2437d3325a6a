//! Single-file auth state for messaging-protocol sessions.
//!
//! This crate provides:
//! - Fresh credential generation (Curve25519 via libsignal)
//! - A buffer-aware JSON codec compatible with the session file format
//! - A typed key namespace over one flat `"category-id"` map
//! - `app-state-sync-key` record decoding
//! - A store that keeps everything in memory and rewrites one JSON file on
//!   every mutation

pub mod buffer_json;
pub mod config;
pub mod creds;
pub mod error;
pub mod keys;
pub mod namespace;
pub mod persistence;
pub mod single_file;
pub mod store;
pub mod sync_key;

// Re-export key types for convenience
pub use buffer_json::Bytes;
pub use config::StoreOptions;
pub use creds::{init_auth_creds, AuthenticationCreds, Credentials};
pub use error::{Result, StoreError};
pub use namespace::{Category, KeyRef};
pub use persistence::AuthState;
pub use single_file::{use_single_file_auth_state, SingleFileAuthState, SingleFileKeyStore};
pub use store::{SignalDataMap, SignalDataSet, SignalKeyStore, SignalKeyValue};
pub use sync_key::AppStateSyncKeyData;
