//! Auth state kept in one JSON file.
//!
//! Convenient for small bots, but every mutation rewrites the whole file, so
//! it is less efficient than a store with one file per key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::StoreOptions;
use crate::creds::Credentials;
use crate::error::Result;
use crate::namespace::{Category, KeyRef};
use crate::persistence::{
    prepare_parent_dir, read_auth_state, render_auth_state, resolve_backing_file,
    write_auth_state, AuthState, DirStatus,
};
use crate::store::{is_truthy, SignalDataMap, SignalDataSet, SignalKeyStore, SignalKeyValue};
use crate::sync_key::AppStateSyncKeyData;

/// Open the store at `session_path` with default options.
///
/// A path whose file name ends in `.json` is used as the file; any other path
/// is treated as a directory holding `creds.json`.
pub async fn use_single_file_auth_state(
    session_path: impl AsRef<Path>,
) -> Result<SingleFileAuthState> {
    SingleFileAuthState::open(session_path).await
}

struct Shared {
    path: PathBuf,
    state: Mutex<AuthState>,
    /// Present when writes are serialized.
    write_gate: Option<Mutex<()>>,
}

impl Shared {
    /// Mutate the in-memory state, snapshot it, then write the snapshot.
    ///
    /// The state lock is released before the file write starts.
    async fn persist_with<R>(&self, mutate: impl FnOnce(&mut AuthState) -> R) -> Result<R> {
        let _gate = match &self.write_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let (out, contents) = {
            let mut state = self.state.lock().await;
            let out = mutate(&mut state);
            (out, render_auth_state(&state)?)
        };

        write_auth_state(&self.path, contents).await?;
        Ok(out)
    }
}

/// Handle over one backing file. Clones share the same in-memory state.
#[derive(Clone)]
pub struct SingleFileAuthState {
    keys: SingleFileKeyStore,
}

impl SingleFileAuthState {
    pub async fn open(session_path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(session_path, StoreOptions::default()).await
    }

    /// Resolve the backing file, then load it or start with fresh credentials.
    pub async fn open_with_options(
        session_path: impl AsRef<Path>,
        options: StoreOptions,
    ) -> Result<Self> {
        let path = resolve_backing_file(session_path.as_ref());

        if let DirStatus::Unavailable(e) = prepare_parent_dir(&path).await {
            warn!(path = %path.display(), "could not create auth state directory: {e}");
        }

        let state = read_auth_state(&path).await.into_state_or_fresh(&path)?;

        info!(
            path = %path.display(),
            keys = state.keys.len(),
            registered = state.creds.registered(),
            serialize_writes = options.serialize_writes,
            "auth state opened"
        );

        let shared = Arc::new(Shared {
            path,
            state: Mutex::new(state),
            write_gate: options.serialize_writes.then(|| Mutex::new(())),
        });

        Ok(Self {
            keys: SingleFileKeyStore { shared },
        })
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.keys.shared.path
    }

    pub fn keys(&self) -> &SingleFileKeyStore {
        &self.keys
    }

    /// Copy of the current credentials.
    pub async fn creds(&self) -> Credentials {
        self.keys.shared.state.lock().await.creds.clone()
    }

    /// In-place access to the credentials. Changes stay in memory until
    /// [`save_creds`](Self::save_creds); drop the guard before calling it.
    pub async fn creds_mut(&self) -> MappedMutexGuard<'_, Credentials> {
        MutexGuard::map(self.keys.shared.state.lock().await, |state| &mut state.creds)
    }

    /// Copy of the whole in-memory state.
    pub async fn snapshot(&self) -> AuthState {
        self.keys.shared.state.lock().await.clone()
    }

    /// Write the full state (credentials and every key) to disk.
    pub async fn save_creds(&self) -> Result<()> {
        self.keys.shared.persist_with(|_| ()).await?;
        debug!(path = %self.path().display(), "credentials saved");
        Ok(())
    }
}

/// Key half of the facade. Reads are served from memory; every `set` rewrites the file.
#[derive(Clone)]
pub struct SingleFileKeyStore {
    shared: Arc<Shared>,
}

#[async_trait::async_trait]
impl SignalKeyStore for SingleFileKeyStore {
    async fn get(&self, category: &Category, ids: &[String]) -> SignalDataMap {
        let state = self.shared.state.lock().await;
        let mut data = HashMap::with_capacity(ids.len());
        // Compare tags, so `Other("app-state-sync-key")` decodes too.
        let is_app_state_sync_key = category.as_str() == Category::AppStateSyncKey.as_str();

        for id in ids {
            let Some(value) = state.keys.get(&KeyRef::new(category, id).composite()) else {
                continue;
            };
            let value = if is_app_state_sync_key && is_truthy(value) {
                SignalKeyValue::AppStateSyncKey(AppStateSyncKeyData::from_object(value))
            } else {
                SignalKeyValue::Json(value.clone())
            };
            data.insert(id.clone(), value);
        }

        data
    }

    async fn set(&self, data: SignalDataSet) -> Result<()> {
        let (stored, removed) = self
            .shared
            .persist_with(move |state| {
                let (mut stored, mut removed) = (0usize, 0usize);
                for (category, entries) in data {
                    for (id, value) in entries {
                        let key = KeyRef::new(&category, &id).composite();
                        match value {
                            Some(value) if is_truthy(&value) => {
                                state.keys.insert(key, value);
                                stored += 1;
                            }
                            _ => {
                                if state.keys.remove(&key).is_some() {
                                    removed += 1;
                                }
                            }
                        }
                    }
                }
                (stored, removed)
            })
            .await?;

        debug!(stored, removed, "keys updated");
        Ok(())
    }
}
