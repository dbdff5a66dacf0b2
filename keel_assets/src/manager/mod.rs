//! The asset manager context object.
//!
//! Locking is coarse: the registry (metadata and path index) sits behind one mutex and the
//! cache behind another. No lock is ever held while an importer or a subscriber runs.

mod lifecycle;
mod load;
mod query;

use crate::asset::Asset;
use crate::asset_type::AssetType;
use crate::cache::AssetCache;
use crate::desc::AssetManagerDesc;
use crate::error::AssetError;
use crate::importer::{AssetImporter, ImporterTable};
use crate::importers::{MeshSourceImporter, SceneImporter, TextureImporter};
use crate::metadata::{AssetFlags, AssetMetadata, AssetState};
use crate::registry::{AssetRegistry, RegistryDocument};
use crate::subscriber::{AssetEventCallback, SubscriberBus, SubscriberHandle};
use anyhow::Context;
use keel_concurrent::prelude::{Jobs, PendingTask, TaskCounter};
use keel_render::prelude::{BindlessAllocator, GpuDescriptorTable, GpuDevice, SharedBindlessTable};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::{Duration, Instant};

struct AssetManagerInner {
    desc: AssetManagerDesc,
    device: Arc<dyn GpuDevice>,
    jobs: Jobs,
    registry: Mutex<AssetRegistry>,
    cache: Mutex<AssetCache>,
    importers: RwLock<ImporterTable>,
    subscribers: SubscriberBus,
    tasks: TaskCounter,
    bindless: SharedBindlessTable,
    /// Serializes registry writes so an older snapshot never lands after a newer one
    persist_lock: Mutex<()>,
}

/// Shared handle to the asset system. Clones refer to the same manager.
#[derive(Clone)]
pub struct AssetManager {
    inner: Arc<AssetManagerInner>,
}

/// Non-owning reference held by in-flight work, so pending continuations never keep a
/// manager alive
#[derive(Clone, Default)]
pub struct WeakAssetManager {
    inner: Weak<AssetManagerInner>,
}

impl WeakAssetManager {
    pub fn upgrade(&self) -> Option<AssetManager> {
        self.inner.upgrade().map(|inner| AssetManager { inner })
    }
}

impl std::fmt::Debug for WeakAssetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakAssetManager")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl std::fmt::Debug for AssetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetManager")
            .field("desc", &self.inner.desc)
            .field("registered", &self.registry().len())
            .field("loaded", &self.cache().len())
            .field("pending_tasks", &self.inner.tasks.get())
            .finish()
    }
}

/// Log a failed operation and collapse it into `None`
pub(crate) fn report<T>(operation: &str, result: Result<T, AssetError>) -> Option<T> {
    result
        .inspect_err(|e| tracing::error!("{operation}: {e}"))
        .ok()
}

impl AssetManager {
    /// Create a manager with the built-in importers and load the registry document if it
    /// exists.
    pub fn new(
        desc: AssetManagerDesc,
        device: Arc<dyn GpuDevice>,
        jobs: Jobs,
    ) -> anyhow::Result<Self> {
        let table = GpuDescriptorTable::new(device.clone(), desc.descriptor_table_capacity)
            .context("Creating bindless descriptor table")?;
        let manager = Self {
            inner: Arc::new(AssetManagerInner {
                desc,
                device,
                jobs,
                registry: Mutex::new(AssetRegistry::new()),
                cache: Mutex::new(AssetCache::new()),
                importers: RwLock::new(ImporterTable::new()),
                subscribers: SubscriberBus::new(),
                tasks: TaskCounter::new(),
                bindless: BindlessAllocator::new_shared(table),
                persist_lock: Mutex::new(()),
            }),
        };
        manager.register_importer(AssetType::Texture2D, Arc::new(TextureImporter::default()));
        manager.register_importer(
            AssetType::MeshSource,
            Arc::new(MeshSourceImporter::default()),
        );
        manager.register_importer(AssetType::Scene, Arc::new(SceneImporter));

        let loaded = manager.try_deserialize().with_context(|| {
            format!(
                "Loading asset registry {}",
                manager.inner.desc.registry_file_path.display()
            )
        })?;
        tracing::info!("Asset registry loaded with {loaded} entries");
        Ok(manager)
    }

    pub fn downgrade(&self) -> WeakAssetManager {
        WeakAssetManager {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn desc(&self) -> &AssetManagerDesc {
        &self.inner.desc
    }

    pub fn device(&self) -> &Arc<dyn GpuDevice> {
        &self.inner.device
    }

    pub fn jobs(&self) -> &Jobs {
        &self.inner.jobs
    }

    pub fn bindless_table(&self) -> &SharedBindlessTable {
        &self.inner.bindless
    }

    /// Install the importer used for `asset_type`, replacing any previous one
    pub fn register_importer(&self, asset_type: AssetType, importer: Arc<dyn AssetImporter>) {
        self.inner
            .importers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(asset_type, importer);
    }

    pub(crate) fn importer(
        &self,
        asset_type: AssetType,
    ) -> Result<Arc<dyn AssetImporter>, AssetError> {
        self.inner
            .importers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(asset_type)
            .ok_or_else(|| AssetError::UnsupportedType(asset_type.to_string()))
    }

    pub(crate) fn registry(&self) -> MutexGuard<'_, AssetRegistry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn cache(&self) -> MutexGuard<'_, AssetCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, callback: Arc<dyn AssetEventCallback>) -> SubscriberHandle {
        self.inner.subscribers.subscribe(callback)
    }

    pub fn try_unsubscribe(&self, handle: SubscriberHandle) -> Result<(), AssetError> {
        self.inner.subscribers.unsubscribe(handle)
    }

    pub fn unsubscribe(&self, handle: SubscriberHandle) -> bool {
        report("unsubscribe", self.try_unsubscribe(handle)).is_some()
    }

    pub(crate) fn emit(&self, f: impl Fn(&dyn AssetEventCallback)) {
        self.inner.subscribers.emit(f);
    }

    pub fn notify_loaded(&self, asset: &Asset) {
        self.emit(|subscriber| subscriber.on_asset_loaded(asset));
    }

    /// Count one unit of asynchronous work until the returned guard is dropped
    pub fn begin_task(&self) -> PendingTask {
        self.inner.tasks.begin()
    }

    /// Flag `asset` as memory-only and register metadata for it without a path
    pub fn try_mark_as_memory_only(
        &self,
        asset: &Asset,
        asset_type: AssetType,
    ) -> Result<(), AssetError> {
        asset.insert_flags(AssetFlags::IS_MEMORY_ONLY);
        self.registry()
            .register(asset.handle(), AssetMetadata::memory_only(asset_type))
    }

    pub fn mark_as_memory_only(&self, asset: &Asset, asset_type: AssetType) -> bool {
        report(
            "mark_as_memory_only",
            self.try_mark_as_memory_only(asset, asset_type),
        )
        .is_some()
    }

    /// Register `asset` as a memory-only sub-asset and cache it
    pub fn adopt_memory_asset(&self, asset: &Asset) -> Result<(), AssetError> {
        self.try_mark_as_memory_only(asset, asset.asset_type())?;
        self.cache().insert(asset.clone());
        Ok(())
    }

    /// Complete an asynchronous import on the main context.
    ///
    /// If the placeholder has left the cache in the meantime the completion is dropped, along
    /// with any sub-assets already attached to it. Otherwise `finalize` runs, then the asset
    /// becomes `Loaded` and subscribers hear about it. A failing `finalize` discards the
    /// placeholder.
    pub fn finish_async(
        &self,
        asset: &Asset,
        finalize: impl FnOnce(&AssetManager, &Asset) -> anyhow::Result<()>,
    ) {
        if !self.cache().holds(asset) {
            tracing::trace!(
                "Asset {} left the cache before its import finished",
                asset.handle()
            );
            self.unload_dependencies(asset);
            return;
        }
        match finalize(self, asset) {
            Ok(()) => {
                asset.set_state(AssetState::Loaded);
                tracing::debug!("Loaded {} {}", asset.asset_type(), asset.handle());
                self.notify_loaded(asset);
            }
            Err(e) => self.discard_async(asset, e),
        }
    }

    /// Drop a placeholder whose import failed along with the sub-assets it owns. Memory-only
    /// assets lose their metadata too.
    pub fn discard_async(&self, asset: &Asset, error: anyhow::Error) {
        tracing::error!(
            "Asynchronous import of {} {} failed: {error:#}",
            asset.asset_type(),
            asset.handle()
        );
        let removed = self.cache().remove_if_same(asset);
        if removed && asset.is_memory_only() {
            self.registry().unregister(asset.handle());
        }
        self.unload_dependencies(asset);
    }

    fn unload_dependencies(&self, asset: &Asset) {
        for dependency in asset.dependencies() {
            self.unload_asset(dependency);
        }
    }

    /// Write the registry document, pruning entries whose file is gone
    pub fn try_serialize(&self) -> Result<(), AssetError> {
        let _guard = self
            .inner
            .persist_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let document = self.registry().to_document(&self.inner.desc.assets_directory);
        document.write(&self.inner.desc.registry_file_path)
    }

    pub fn serialize(&self) -> bool {
        report("serialize", self.try_serialize()).is_some()
    }

    /// Merge the registry document into the registry. A missing document is not an error.
    pub fn try_deserialize(&self) -> Result<usize, AssetError> {
        let Some(document) = RegistryDocument::read(&self.inner.desc.registry_file_path)? else {
            return Ok(0);
        };
        Ok(self.registry().load_document(document))
    }

    pub fn deserialize(&self) -> bool {
        report("deserialize", self.try_deserialize()).is_some()
    }

    pub(crate) fn persist(&self) {
        self.serialize();
    }

    /// Run the main-context continuations queued so far. Call once per tick from the context
    /// that owns the GPU.
    pub fn update(&self) -> usize {
        self.inner.jobs.run_main_thread_tasks()
    }

    /// Pump [`AssetManager::update`] until no asynchronous work is outstanding
    pub fn wait_for_async_tasks(&self) {
        while !self.inner.tasks.is_idle() {
            if self.update() == 0 {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    /// Like [`AssetManager::wait_for_async_tasks`] but gives up after `timeout`. Returns
    /// whether everything finished.
    pub fn wait_for_async_tasks_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.inner.tasks.is_idle() {
            if Instant::now() >= deadline {
                return false;
            }
            if self.update() == 0 {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
        true
    }
}
