use crate::asset::Asset;
use crate::asset_type::AssetType;
use crate::handle::AssetHandle;
use crate::manager::AssetManager;
use crate::metadata::AssetMetadata;
use anyhow::Result;
use std::sync::Arc;

/// Loads, saves and creates assets of one [`AssetType`].
///
/// Importers receive the manager so they can resolve paths, reach the GPU device and job
/// system, and register memory-only sub-assets.
pub trait AssetImporter: Send + Sync {
    /// Load the asset and return it fully loaded. Blocks the caller.
    fn import(
        &self,
        ctx: &AssetManager,
        handle: AssetHandle,
        metadata: &AssetMetadata,
    ) -> Result<Asset>;

    fn supports_async(&self) -> bool {
        false
    }

    /// Start loading into `placeholder`, which is already cached in the `Loading` state, and
    /// return immediately.
    ///
    /// Completion must go through [`AssetManager::finish_async`] on the main context. An error
    /// returned here means nothing was scheduled.
    #[allow(unused_variables)]
    fn import_async(
        &self,
        ctx: &AssetManager,
        placeholder: &Asset,
        metadata: &AssetMetadata,
    ) -> Result<()> {
        anyhow::bail!(
            "{} importer does not support asynchronous import",
            metadata.asset_type
        )
    }

    #[allow(unused_variables)]
    fn save(&self, ctx: &AssetManager, asset: &Asset, metadata: &AssetMetadata) -> Result<()> {
        anyhow::bail!("Saving {} assets is not supported", metadata.asset_type)
    }

    /// Create a brand new asset at the metadata's path
    #[allow(unused_variables)]
    fn create(
        &self,
        ctx: &AssetManager,
        handle: AssetHandle,
        metadata: &AssetMetadata,
    ) -> Result<Asset> {
        anyhow::bail!("Creating {} assets is not supported", metadata.asset_type)
    }
}

/// One importer slot per [`AssetType`]
#[derive(Default)]
pub struct ImporterTable {
    importers: [Option<Arc<dyn AssetImporter>>; AssetType::COUNT],
}

impl ImporterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset_type: AssetType) -> Option<Arc<dyn AssetImporter>> {
        self.importers[asset_type.index()].clone()
    }

    /// Install `importer`, returning the one it replaces
    pub fn set(
        &mut self,
        asset_type: AssetType,
        importer: Arc<dyn AssetImporter>,
    ) -> Option<Arc<dyn AssetImporter>> {
        self.importers[asset_type.index()].replace(importer)
    }

    pub fn remove(&mut self, asset_type: AssetType) -> Option<Arc<dyn AssetImporter>> {
        self.importers[asset_type.index()].take()
    }
}

impl std::fmt::Debug for ImporterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                AssetType::ALL
                    .iter()
                    .filter(|ty| self.importers[ty.index()].is_some()),
            )
            .finish()
    }
}
