use serde::Deserialize;
use std::path::PathBuf;

/// How [`crate::AssetManager::get_asset`] materializes a cache miss
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
pub enum ImportMode {
    /// Block until the asset is fully loaded
    Sync,
    /// Return a loading placeholder and finish on the worker pool and main context.
    /// Types whose importer cannot load asynchronously fall back to `Sync`.
    #[default]
    Async,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssetManagerDesc {
    /// Root every relative asset path resolves against
    pub assets_directory: PathBuf,
    pub registry_file_path: PathBuf,
    pub import_mode: ImportMode,
    /// Initial capacity of the bindless descriptor table
    pub descriptor_table_capacity: u32,
}

impl Default for AssetManagerDesc {
    fn default() -> Self {
        Self {
            assets_directory: PathBuf::from("assets"),
            registry_file_path: PathBuf::from("assets/AssetRegistry.json"),
            import_mode: ImportMode::default(),
            descriptor_table_capacity: 64,
        }
    }
}

impl AssetManagerDesc {
    /// Place both the assets and the registry document under `directory`
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        let assets_directory = directory.into();
        Self {
            registry_file_path: assets_directory.join("AssetRegistry.json"),
            assets_directory,
            ..Default::default()
        }
    }

    pub fn with_registry_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_file_path = path.into();
        self
    }

    pub fn with_import_mode(mut self, import_mode: ImportMode) -> Self {
        self.import_mode = import_mode;
        self
    }

    pub fn with_descriptor_table_capacity(mut self, capacity: u32) -> Self {
        self.descriptor_table_capacity = capacity;
        self
    }
}
