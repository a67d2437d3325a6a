use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write auth state to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("credential generation failed: {0}")]
    KeyGeneration(#[from] libsignal_protocol::SignalProtocolError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
