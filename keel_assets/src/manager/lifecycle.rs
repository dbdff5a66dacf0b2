use super::{AssetManager, report};
use crate::asset_type::AssetType;
use crate::error::AssetError;
use crate::handle::AssetHandle;
use crate::metadata::{AssetMetadata, AssetState, normalize_path};
use std::collections::HashSet;
use std::path::Path;

/// Unload order: owners first so their cascades take the sub-assets with them
const UNLOAD_ORDER: [AssetType; 4] = [
    AssetType::Scene,
    AssetType::MeshSource,
    AssetType::Material,
    AssetType::Texture2D,
];

impl AssetManager {
    /// Unload `handle` and, recursively, everything it depends on.
    ///
    /// Unloading an asset that is not cached is a no-op, which is what makes shared and
    /// already cascaded dependencies safe. Returns whether `handle` itself was unloaded.
    pub fn unload_asset(&self, handle: AssetHandle) -> bool {
        let mut visited = HashSet::new();
        self.unload_recursive(handle, &mut visited)
    }

    fn unload_recursive(&self, handle: AssetHandle, visited: &mut HashSet<AssetHandle>) -> bool {
        if !visited.insert(handle) {
            return false;
        }
        let Some(asset) = self.find_asset(handle) else {
            tracing::trace!("Asset {handle} is not loaded, nothing to unload");
            return false;
        };
        tracing::trace!("Unloading {} {handle}", asset.asset_type());
        self.emit(|subscriber| subscriber.on_asset_unloaded(&asset));

        for dependency in asset.dependencies() {
            self.unload_recursive(dependency, visited);
        }

        self.cache().remove_if_same(&asset);
        let memory_only = asset.is_memory_only()
            || self
                .registry()
                .get(handle)
                .is_some_and(AssetMetadata::is_memory_only);
        if memory_only {
            self.registry().unregister(handle);
        }
        asset.set_state(AssetState::None);
        // frees GPU resources held by the payload
        drop(asset.take_payload());
        true
    }

    /// Unload every cached asset, owners before the assets they own
    pub fn unload_all_assets(&self) {
        let rest = AssetType::ALL
            .into_iter()
            .filter(|asset_type| !UNLOAD_ORDER.contains(asset_type));
        for asset_type in UNLOAD_ORDER.into_iter().chain(rest) {
            let handles = self.cache().handles_of_type(asset_type);
            for handle in handles {
                self.unload_asset(handle);
            }
        }
        tracing::debug!("Unloaded all assets");
    }

    /// Forget `handle` entirely: notify, drop the cached instance and its sub-assets, remove
    /// the metadata and persist.
    pub fn try_remove_asset(&self, handle: AssetHandle) -> Result<(), AssetError> {
        if !self.registry().contains(handle) {
            return Err(AssetError::NotFound(handle));
        }
        self.emit(|subscriber| subscriber.on_asset_removed(handle));

        let removed = self.cache().remove(handle);
        if let Some(asset) = removed {
            let mut visited = HashSet::from([handle]);
            for dependency in asset.dependencies() {
                self.unload_recursive(dependency, &mut visited);
            }
            asset.set_state(AssetState::None);
            drop(asset.take_payload());
        }

        let metadata = self.registry().unregister(handle);
        if metadata.is_some_and(|metadata| !metadata.is_memory_only()) {
            self.persist();
        }
        tracing::debug!("Removed asset {handle}");
        Ok(())
    }

    pub fn remove_asset(&self, handle: AssetHandle) -> bool {
        report("remove_asset", self.try_remove_asset(handle)).is_some()
    }

    /// Point a file-backed asset at a new path. The type stays what it was.
    pub fn try_change_asset_path(
        &self,
        handle: AssetHandle,
        new_path: impl AsRef<Path>,
    ) -> Result<(), AssetError> {
        self.registry()
            .change_path(handle, normalize_path(new_path.as_ref()))?;
        self.persist();
        Ok(())
    }

    pub fn change_asset_path(&self, handle: AssetHandle, new_path: impl AsRef<Path>) -> bool {
        report(
            "change_asset_path",
            self.try_change_asset_path(handle, new_path),
        )
        .is_some()
    }

    /// Replace the metadata of a registered asset
    pub fn try_update_metadata(
        &self,
        handle: AssetHandle,
        metadata: AssetMetadata,
    ) -> Result<(), AssetError> {
        let metadata = AssetMetadata::new(&metadata.file_path, metadata.asset_type);
        {
            let mut registry = self.registry();
            let previous = registry
                .unregister(handle)
                .ok_or(AssetError::NotFound(handle))?;
            if let Err(e) = registry.register(handle, metadata) {
                if let Err(restore) = registry.register(handle, previous) {
                    tracing::error!("Failed to restore metadata of {handle}: {restore}");
                }
                return Err(e);
            }
        }
        self.persist();
        Ok(())
    }

    pub fn update_metadata(&self, handle: AssetHandle, metadata: AssetMetadata) -> bool {
        report("update_metadata", self.try_update_metadata(handle, metadata)).is_some()
    }
}
