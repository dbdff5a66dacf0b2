use crate::asset::Asset;
use crate::asset_type::AssetType;
use crate::handle::AssetHandle;
use std::collections::HashMap;

/// Handle to loaded (or loading) asset instance
#[derive(Debug, Default)]
pub struct AssetCache {
    assets: HashMap<AssetHandle, Asset>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, handle: AssetHandle) -> Option<Asset> {
        self.assets.get(&handle).cloned()
    }

    pub fn contains(&self, handle: AssetHandle) -> bool {
        self.assets.contains_key(&handle)
    }

    /// Whether `asset` is the very instance cached under its handle
    pub fn holds(&self, asset: &Asset) -> bool {
        self.assets.get(&asset.handle()) == Some(asset)
    }

    /// Replace whatever is cached under the asset's handle
    pub fn insert(&mut self, asset: Asset) -> Option<Asset> {
        self.assets.insert(asset.handle(), asset)
    }

    /// Cache `asset` unless its handle already has an entry. Returns the entry that ends up
    /// cached.
    pub fn insert_if_absent(&mut self, asset: Asset) -> Asset {
        self.assets.entry(asset.handle()).or_insert(asset).clone()
    }

    pub fn remove(&mut self, handle: AssetHandle) -> Option<Asset> {
        self.assets.remove(&handle)
    }

    /// Remove the entry only if it is still `asset`, so a stale instance never evicts a newer
    /// one.
    pub fn remove_if_same(&mut self, asset: &Asset) -> bool {
        if self.holds(asset) {
            self.assets.remove(&asset.handle());
            true
        } else {
            false
        }
    }

    pub fn handles(&self) -> Vec<AssetHandle> {
        self.assets.keys().copied().collect()
    }

    pub fn handles_of_type(&self, asset_type: AssetType) -> Vec<AssetHandle> {
        self.assets
            .iter()
            .filter(|(_, asset)| asset.asset_type() == asset_type)
            .map(|(handle, _)| *handle)
            .collect()
    }
}
