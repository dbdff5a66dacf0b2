//! Handle to metadata bookkeeping and the persisted registry document.

use crate::asset_type::AssetType;
use crate::error::AssetError;
use crate::handle::AssetHandle;
use crate::metadata::{AssetMetadata, path_to_string};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub handle: AssetHandle,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "type")]
    pub asset_type: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(rename = "metaMap", alias = "assets")]
    pub assets: Vec<RegistryEntry>,
}

impl RegistryDocument {
    pub fn read(path: &Path) -> Result<Option<Self>, AssetError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Rewrite the whole document at `path`
    pub fn write(&self, path: &Path) -> Result<(), AssetError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Metadata of every registered asset plus the path index over file-backed ones.
///
/// The path index maps each non memory-only path to exactly one handle and memory-only assets
/// never appear in it.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    metadata: HashMap<AssetHandle, AssetMetadata>,
    path_index: HashMap<PathBuf, AssetHandle>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn contains(&self, handle: AssetHandle) -> bool {
        self.metadata.contains_key(&handle)
    }

    pub fn get(&self, handle: AssetHandle) -> Option<&AssetMetadata> {
        self.metadata.get(&handle)
    }

    pub fn handle_for_path(&self, path: &Path) -> Option<AssetHandle> {
        self.path_index.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetHandle, &AssetMetadata)> {
        self.metadata.iter()
    }

    pub fn register(
        &mut self,
        handle: AssetHandle,
        metadata: AssetMetadata,
    ) -> Result<(), AssetError> {
        if let Some(existing) = self.metadata.get(&handle) {
            return Err(AssetError::AlreadyRegistered {
                handle,
                path: path_to_string(&existing.file_path),
            });
        }
        if !metadata.is_memory_only() {
            if let Some(owner) = self.path_index.get(&metadata.file_path) {
                return Err(AssetError::AlreadyRegistered {
                    handle: *owner,
                    path: path_to_string(&metadata.file_path),
                });
            }
            self.path_index.insert(metadata.file_path.clone(), handle);
        }
        self.metadata.insert(handle, metadata);
        Ok(())
    }

    pub fn unregister(&mut self, handle: AssetHandle) -> Option<AssetMetadata> {
        let metadata = self.metadata.remove(&handle)?;
        if !metadata.is_memory_only() && self.path_index.get(&metadata.file_path) == Some(&handle)
        {
            self.path_index.remove(&metadata.file_path);
        }
        Some(metadata)
    }

    /// Move a file-backed asset to `new_path`, keeping its type
    pub fn change_path(&mut self, handle: AssetHandle, new_path: PathBuf) -> Result<(), AssetError> {
        let metadata = self
            .metadata
            .get(&handle)
            .ok_or(AssetError::NotFound(handle))?;
        if metadata.is_memory_only() {
            return Err(AssetError::MemoryOnly(handle));
        }
        if new_path.as_os_str().is_empty() {
            return Err(AssetError::PathNotFound(String::new()));
        }
        match self.path_index.get(&new_path) {
            Some(owner) if *owner == handle => return Ok(()),
            Some(owner) => {
                return Err(AssetError::AlreadyRegistered {
                    handle: *owner,
                    path: path_to_string(&new_path),
                });
            }
            None => {}
        }
        let old_path = std::mem::replace(
            &mut self
                .metadata
                .get_mut(&handle)
                .ok_or(AssetError::NotFound(handle))?
                .file_path,
            new_path.clone(),
        );
        self.path_index.remove(&old_path);
        self.path_index.insert(new_path, handle);
        Ok(())
    }

    /// Snapshot of the persistable entries, ordered by handle.
    ///
    /// Memory-only assets are skipped, as is every asset whose file no longer exists under
    /// `assets_directory`. Pruned assets stay registered in memory.
    pub fn to_document(&self, assets_directory: &Path) -> RegistryDocument {
        let mut assets: Vec<RegistryEntry> = self
            .metadata
            .iter()
            .filter(|(_, metadata)| !metadata.is_memory_only())
            .filter(|(handle, metadata)| {
                let exists = assets_directory.join(&metadata.file_path).exists();
                if !exists {
                    tracing::debug!(
                        "Pruning {} ({handle}) from registry, file does not exist",
                        metadata.file_path.display()
                    );
                }
                exists
            })
            .map(|(handle, metadata)| RegistryEntry {
                handle: *handle,
                file_path: path_to_string(&metadata.file_path),
                asset_type: metadata.asset_type.to_string(),
            })
            .collect();
        assets.sort_by_key(|entry| entry.handle);
        RegistryDocument { assets }
    }

    /// Register every usable entry of `document`, returning how many were added.
    ///
    /// Entries with an unknown type, a null handle or a conflicting handle or path are skipped.
    pub fn load_document(&mut self, document: RegistryDocument) -> usize {
        let mut loaded = 0;
        for entry in document.assets {
            let asset_type = match entry.asset_type.parse::<AssetType>() {
                Ok(AssetType::None) | Err(_) => {
                    tracing::warn!(
                        "Skipping registry entry {} with unknown type {:?}",
                        entry.file_path,
                        entry.asset_type
                    );
                    continue;
                }
                Ok(asset_type) => asset_type,
            };
            if !entry.handle.is_valid() || entry.file_path.is_empty() {
                tracing::warn!("Skipping malformed registry entry {:?}", entry);
                continue;
            }
            let metadata = AssetMetadata::new(&entry.file_path, asset_type);
            match self.register(entry.handle, metadata) {
                Ok(()) => loaded += 1,
                Err(e) => tracing::warn!("Skipping registry entry: {e}"),
            }
        }
        loaded
    }
}
