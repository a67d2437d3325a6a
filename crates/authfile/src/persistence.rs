//! Backing-file persistence for the auth state.
//!
//! The whole state lives in one pretty-printed JSON file. Every save rewrites
//! the file in a single `write` call; there is no temp file and no rename, so
//! a crash mid-write can leave a truncated file. A truncated file then loads
//! as [`LoadResult::Corrupt`] and the store starts over with fresh credentials.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::creds::{init_auth_creds, Credentials};
use crate::error::{Result, StoreError};

/// File name used when the session path is a directory.
pub const DEFAULT_FILE_NAME: &str = "creds.json";

/// Root object of the backing file.
///
/// Only the root shape is checked on load: `creds` must be an object, `keys`
/// a map. Credentials this crate cannot model load as [`Credentials::Raw`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    pub creds: Credentials,
    /// `"category-id"` -> stored value.
    #[serde(default)]
    pub keys: BTreeMap<String, Value>,
}

impl AuthState {
    /// New credentials, no keys.
    pub fn fresh() -> Result<Self> {
        Ok(Self {
            creds: init_auth_creds()?.into(),
            keys: BTreeMap::new(),
        })
    }
}

/// Outcome of reading the backing file.
#[derive(Debug)]
pub enum LoadResult {
    Loaded(AuthState),
    NotFound,
    Unreadable(std::io::Error),
    Corrupt(serde_json::Error),
}

impl LoadResult {
    /// The loaded state, or a fresh one for every other outcome.
    pub fn into_state_or_fresh(self, path: &Path) -> Result<AuthState> {
        match self {
            LoadResult::Loaded(state) => return Ok(state),
            LoadResult::NotFound => {
                debug!(path = %path.display(), "no auth state on disk, starting fresh");
            }
            LoadResult::Unreadable(e) => {
                warn!(path = %path.display(), "auth state unreadable, starting fresh: {e}");
            }
            LoadResult::Corrupt(e) => {
                warn!(path = %path.display(), "auth state corrupt, starting fresh: {e}");
            }
        }
        AuthState::fresh()
    }
}

/// Whether the backing file's directory is usable.
#[derive(Debug)]
pub enum DirStatus {
    Ready,
    Unavailable(std::io::Error),
}

/// A path ending in `.json` is the file itself; anything else is a directory
/// holding `creds.json`.
pub fn resolve_backing_file(session_path: &Path) -> PathBuf {
    let is_json_file = session_path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".json"));

    if is_json_file {
        session_path.to_path_buf()
    } else {
        session_path.join(DEFAULT_FILE_NAME)
    }
}

/// Create the parent directory of `file`. Failure is reported, not returned as
/// an error: the first write is what decides whether the store is usable.
pub async fn prepare_parent_dir(file: &Path) -> DirStatus {
    let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return DirStatus::Ready;
    };

    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => DirStatus::Ready,
        Err(e) => DirStatus::Unavailable(e),
    }
}

pub async fn read_auth_state(file: &Path) -> LoadResult {
    let contents = match tokio::fs::read_to_string(file).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return LoadResult::NotFound,
        Err(e) => return LoadResult::Unreadable(e),
    };

    match serde_json::from_str(&contents) {
        Ok(state) => LoadResult::Loaded(state),
        Err(e) => LoadResult::Corrupt(e),
    }
}

/// Pretty-printed JSON of the full state, exactly as it is written to disk.
pub fn render_auth_state(state: &AuthState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Overwrite the backing file with `contents` in one call.
pub async fn write_auth_state(file: &Path, contents: String) -> Result<()> {
    let len = contents.len();
    tokio::fs::write(file, contents)
        .await
        .map_err(|source| StoreError::Write {
            path: file.to_path_buf(),
            source,
        })?;
    debug!(path = %file.display(), bytes = len, "auth state written");
    Ok(())
}
