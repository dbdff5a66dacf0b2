use super::AssetManager;
use crate::asset_type::AssetType;
use crate::error::AssetError;
use crate::handle::AssetHandle;
use crate::metadata::{AssetMetadata, normalize_path};
use std::path::{Path, PathBuf};

impl AssetManager {
    pub fn try_metadata(&self, handle: AssetHandle) -> Result<AssetMetadata, AssetError> {
        self.registry()
            .get(handle)
            .cloned()
            .ok_or(AssetError::NotFound(handle))
    }

    pub fn metadata(&self, handle: AssetHandle) -> Option<AssetMetadata> {
        self.registry().get(handle).cloned()
    }

    /// [`AssetType::None`] for unregistered handles
    pub fn asset_type(&self, handle: AssetHandle) -> AssetType {
        self.registry()
            .get(handle)
            .map_or(AssetType::None, |metadata| metadata.asset_type)
    }

    /// Path relative to the assets directory, empty for memory-only assets
    pub fn file_path(&self, handle: AssetHandle) -> Option<PathBuf> {
        self.registry()
            .get(handle)
            .map(|metadata| metadata.file_path.clone())
    }

    pub fn asset_handle_from_file_path(&self, path: impl AsRef<Path>) -> AssetHandle {
        self.registry()
            .handle_for_path(&normalize_path(path.as_ref()))
            .unwrap_or_default()
    }

    /// Where the asset lives on disk. `None` for unknown and memory-only assets.
    pub fn asset_file_system_path(&self, handle: AssetHandle) -> Option<PathBuf> {
        self.metadata(handle)
            .filter(|metadata| !metadata.is_memory_only())
            .map(|metadata| self.resolve_path(&metadata))
    }

    pub fn resolve_path(&self, metadata: &AssetMetadata) -> PathBuf {
        self.desc().assets_directory.join(&metadata.file_path)
    }

    pub fn is_asset_handle_valid(&self, handle: AssetHandle) -> bool {
        handle.is_valid() && self.registry().contains(handle)
    }

    pub fn is_asset_loaded(&self, handle: AssetHandle) -> bool {
        self.find_asset(handle).is_some_and(|asset| asset.is_loaded())
    }

    pub fn is_memory_only(&self, handle: AssetHandle) -> bool {
        self.registry()
            .get(handle)
            .is_some_and(AssetMetadata::is_memory_only)
    }

    /// Handles with a cache entry, loading or loaded
    pub fn loaded_assets(&self) -> Vec<AssetHandle> {
        self.cache().handles()
    }

    pub fn registered_assets(&self) -> Vec<AssetHandle> {
        self.registry().iter().map(|(handle, _)| *handle).collect()
    }

    /// Asynchronous work still waiting on a worker or the main context
    pub fn pending_async_tasks(&self) -> usize {
        self.inner.tasks.get()
    }
}
