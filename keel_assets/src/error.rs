use crate::handle::AssetHandle;
use crate::subscriber::SubscriberHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset {0} has no metadata")]
    NotFound(AssetHandle),
    #[error("No asset is registered at {0}")]
    PathNotFound(String),
    #[error("Unsupported asset type: {0}")]
    UnsupportedType(String),
    #[error("Failed to import {path} ({handle}): {reason}")]
    ImportFailure {
        handle: AssetHandle,
        path: String,
        reason: String,
    },
    #[error("Failed to save {path} ({handle}): {reason}")]
    SaveFailure {
        handle: AssetHandle,
        path: String,
        reason: String,
    },
    #[error("{path} is already registered as {handle}")]
    AlreadyRegistered { handle: AssetHandle, path: String },
    #[error("Unknown subscriber {0:?}")]
    InvalidSubscriber(SubscriberHandle),
    #[error("Asset {0} is memory-only")]
    MemoryOnly(AssetHandle),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
