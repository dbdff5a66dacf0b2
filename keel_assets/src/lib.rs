//! Asset lifecycle: registration, lazy loading, asynchronous import with a main-context
//! hand-off for GPU uploads, dependency-driven unloading and lifecycle notifications.
//!
//! Everything hangs off one [`AssetManager`]; there is no global state.

pub mod asset;
pub mod asset_type;
pub mod cache;
pub mod desc;
pub mod error;
pub mod handle;
pub mod importer;
pub mod importers;
pub mod manager;
pub mod metadata;
pub mod prelude;
pub mod registry;
pub mod subscriber;

pub use asset::{Asset, AssetData};
pub use asset_type::AssetType;
pub use desc::{AssetManagerDesc, ImportMode};
pub use error::AssetError;
pub use handle::AssetHandle;
pub use manager::{AssetManager, WeakAssetManager};
pub use metadata::{AssetFlags, AssetMetadata, AssetState};
