use super::{AssetManager, report};
use crate::asset::Asset;
use crate::asset_type::AssetType;
use crate::desc::ImportMode;
use crate::error::AssetError;
use crate::handle::AssetHandle;
use crate::metadata::{AssetMetadata, AssetState, normalize_path, path_to_string};
use std::path::Path;
use std::time::Instant;

impl AssetManager {
    /// Register the file at `path` (relative to the assets directory) and return its handle.
    ///
    /// Importing an already registered path returns the existing handle. With `load_now` the
    /// asset is also loaded synchronously, and a failed load leaves nothing registered.
    pub fn try_import_asset(
        &self,
        path: impl AsRef<Path>,
        load_now: bool,
    ) -> Result<AssetHandle, AssetError> {
        let file_path = normalize_path(path.as_ref());
        let asset_type = AssetType::from_extension(&file_path);
        let handle = {
            let mut registry = self.registry();
            if let Some(handle) = registry.handle_for_path(&file_path) {
                return Ok(handle);
            }
            if asset_type == AssetType::None {
                return Err(AssetError::UnsupportedType(path_to_string(&file_path)));
            }
            let handle = AssetHandle::new();
            registry.register(handle, AssetMetadata::new(&file_path, asset_type))?;
            handle
        };
        let metadata = AssetMetadata::new(&file_path, asset_type);

        let result = if load_now {
            self.load(handle, &metadata, ImportMode::Sync).map(|_| handle)
        } else {
            Ok(handle)
        };
        if result.is_err() {
            self.registry().unregister(handle);
        }
        self.persist();
        result
    }

    pub fn import_asset(&self, path: impl AsRef<Path>, load_now: bool) -> AssetHandle {
        report("import_asset", self.try_import_asset(path, load_now)).unwrap_or_default()
    }

    /// Return the cached asset, importing it in the configured mode on a miss.
    ///
    /// In async mode the result may still be `Loading`.
    pub fn try_get_asset(&self, handle: AssetHandle) -> Result<Asset, AssetError> {
        if let Some(asset) = self.find_asset(handle) {
            return Ok(asset);
        }
        let metadata = self.try_metadata(handle)?;
        self.load(handle, &metadata, self.desc().import_mode)
    }

    pub fn get_asset(&self, handle: AssetHandle) -> Option<Asset> {
        report("get_asset", self.try_get_asset(handle))
    }

    /// Cache lookup only, never imports
    pub fn find_asset(&self, handle: AssetHandle) -> Option<Asset> {
        self.cache().get(handle)
    }

    /// Unload and import again from the current metadata
    pub fn try_reload_asset(&self, handle: AssetHandle) -> Result<Asset, AssetError> {
        let metadata = self.try_metadata(handle)?;
        if metadata.is_memory_only() {
            return Err(AssetError::MemoryOnly(handle));
        }
        self.unload_asset(handle);
        let asset = self.load(handle, &metadata, self.desc().import_mode)?;
        self.emit(|subscriber| subscriber.on_asset_reloaded(&asset));
        Ok(asset)
    }

    pub fn reload_asset(&self, handle: AssetHandle) -> bool {
        report("reload_asset", self.try_reload_asset(handle)).is_some()
    }

    /// Have the type's importer create a new asset at `path`, then register and cache it
    pub fn try_create_asset(&self, path: impl AsRef<Path>) -> Result<AssetHandle, AssetError> {
        let file_path = normalize_path(path.as_ref());
        let asset_type = AssetType::from_extension(&file_path);
        if asset_type == AssetType::None {
            return Err(AssetError::UnsupportedType(path_to_string(&file_path)));
        }
        let importer = self.importer(asset_type)?;
        if let Some(owner) = self.registry().handle_for_path(&file_path) {
            return Err(AssetError::AlreadyRegistered {
                handle: owner,
                path: path_to_string(&file_path),
            });
        }

        let handle = AssetHandle::new();
        let metadata = AssetMetadata::new(&file_path, asset_type);
        let asset = importer
            .create(self, handle, &metadata)
            .map_err(|e| AssetError::ImportFailure {
                handle,
                path: path_to_string(&file_path),
                reason: format!("{e:#}"),
            })?;
        asset.set_state(AssetState::Loaded);
        self.registry().register(handle, metadata)?;
        self.cache().insert(asset.clone());
        self.persist();
        tracing::info!("Created {asset_type} {} ({handle})", path_to_string(&file_path));
        self.emit(|subscriber| subscriber.on_asset_created(&asset));
        Ok(handle)
    }

    pub fn create_asset(&self, path: impl AsRef<Path>) -> AssetHandle {
        report("create_asset", self.try_create_asset(path)).unwrap_or_default()
    }

    /// Write the asset back to its file through its importer, loading it first if needed
    pub fn try_save_asset(&self, handle: AssetHandle) -> Result<(), AssetError> {
        let metadata = self.try_metadata(handle)?;
        if metadata.is_memory_only() {
            return Err(AssetError::MemoryOnly(handle));
        }
        let importer = self.importer(metadata.asset_type)?;
        let save_failure = |reason: String| AssetError::SaveFailure {
            handle,
            path: path_to_string(&metadata.file_path),
            reason,
        };
        let asset = match self.find_asset(handle) {
            Some(asset) if asset.is_loaded() => asset,
            Some(_) => return Err(save_failure(String::from("asset is still loading"))),
            None => self.load(handle, &metadata, ImportMode::Sync)?,
        };
        importer
            .save(self, &asset, &metadata)
            .map_err(|e| save_failure(format!("{e:#}")))?;
        tracing::info!(
            "Saved {} {}",
            metadata.asset_type,
            path_to_string(&metadata.file_path)
        );
        self.emit(|subscriber| subscriber.on_asset_saved(&asset));
        Ok(())
    }

    pub fn save_asset(&self, handle: AssetHandle) -> bool {
        report("save_asset", self.try_save_asset(handle)).is_some()
    }

    /// Copy an external file into the assets directory as `new_asset_path` and register it.
    ///
    /// An existing destination is left alone unless `overwrite` is set.
    pub fn try_get_or_make_asset(
        &self,
        source_path: impl AsRef<Path>,
        new_asset_path: impl AsRef<Path>,
        overwrite: bool,
    ) -> Result<AssetHandle, AssetError> {
        let relative = normalize_path(new_asset_path.as_ref());
        let destination = self.desc().assets_directory.join(&relative);
        if overwrite || !destination.exists() {
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(source_path.as_ref(), &destination)?;
            tracing::debug!(
                "Copied {} to {}",
                source_path.as_ref().display(),
                destination.display()
            );
        }
        self.try_import_asset(&relative, false)
    }

    pub fn get_or_make_asset(
        &self,
        source_path: impl AsRef<Path>,
        new_asset_path: impl AsRef<Path>,
        overwrite: bool,
    ) -> AssetHandle {
        report(
            "get_or_make_asset",
            self.try_get_or_make_asset(source_path, new_asset_path, overwrite),
        )
        .unwrap_or_default()
    }

    /// Materialize `handle` with its importer and cache the result.
    ///
    /// Async mode caches a `Loading` placeholder before any work is scheduled so concurrent
    /// lookups see it. Importers without async support are run synchronously.
    pub(crate) fn load(
        &self,
        handle: AssetHandle,
        metadata: &AssetMetadata,
        mode: ImportMode,
    ) -> Result<Asset, AssetError> {
        let importer = self.importer(metadata.asset_type)?;
        let path = path_to_string(&metadata.file_path);
        let failure = |e: anyhow::Error| AssetError::ImportFailure {
            handle,
            path: path.clone(),
            reason: format!("{e:#}"),
        };

        if mode == ImportMode::Async {
            if importer.supports_async() {
                let placeholder = Asset::new(handle, metadata.asset_type);
                let cached = self.cache().insert_if_absent(placeholder.clone());
                if cached != placeholder {
                    return Ok(cached);
                }
                if let Err(e) = importer.import_async(self, &placeholder, metadata) {
                    self.cache().remove_if_same(&placeholder);
                    return Err(failure(e));
                }
                tracing::debug!(
                    "Started asynchronous import of {} {path} ({handle})",
                    metadata.asset_type
                );
                return Ok(placeholder);
            }
            tracing::trace!(
                "{} importer is synchronous only, importing {path} synchronously",
                metadata.asset_type
            );
        }

        let start = Instant::now();
        let asset = importer.import(self, handle, metadata).map_err(failure)?;
        asset.set_state(AssetState::Loaded);
        let cached = self.cache().insert_if_absent(asset.clone());
        if cached != asset {
            // lost a race with another import of the same handle
            for dependency in asset.dependencies() {
                self.unload_asset(dependency);
            }
            return Ok(cached);
        }
        tracing::info!(
            "Imported {} {path} ({handle}) [{} ms]",
            metadata.asset_type,
            start.elapsed().as_millis()
        );
        self.notify_loaded(&asset);
        Ok(asset)
    }
}
