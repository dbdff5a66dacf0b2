use crate::asset_type::AssetType;
use crate::handle::AssetHandle;
use crate::metadata::{AssetFlags, AssetState};
use keel_render::prelude::{BindlessHandle, TextureHandle};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UvSet {
    #[default]
    Uv0,
    Uv1,
}

#[derive(Debug)]
pub struct TextureData {
    pub texture: TextureHandle,
    pub width: u32,
    pub height: u32,
    /// Shader-resource slot in the bindless table, released with the payload
    pub descriptor: Option<BindlessHandle>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MeshSourceData {
    pub name: String,
    pub material_count: u32,
    pub texture_count: u32,
    pub mesh_count: u32,
    pub node_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub base_color: [f32; 4],
    /// Null when the material has no base color texture
    pub base_texture: AssetHandle,
    pub uv_set: UvSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneData {
    pub document: serde_json::Value,
}

/// Type-specific contents of a loaded asset
#[derive(Debug, Default)]
pub enum AssetData {
    #[default]
    Empty,
    Texture(TextureData),
    MeshSource(MeshSourceData),
    Material(MaterialData),
    Scene(SceneData),
}

#[derive(Debug)]
struct AssetInstance {
    handle: AssetHandle,
    asset_type: AssetType,
    state: RwLock<AssetState>,
    flags: RwLock<AssetFlags>,
    payload: RwLock<AssetData>,
    dependencies: RwLock<Vec<AssetHandle>>,
}

/// A materialized asset, shared between the cache and whoever asked for it.
///
/// Clones refer to the same instance; equality is identity. Interior state can be updated
/// from any thread, which is how async imports fill in a placeholder that callers already
/// hold.
#[derive(Debug, Clone)]
pub struct Asset(Arc<AssetInstance>);

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Asset {}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Asset {
    /// A new, empty asset in the [`AssetState::Loading`] state
    pub fn new(handle: AssetHandle, asset_type: AssetType) -> Self {
        Self(Arc::new(AssetInstance {
            handle,
            asset_type,
            state: RwLock::new(AssetState::Loading),
            flags: RwLock::new(AssetFlags::empty()),
            payload: RwLock::new(AssetData::Empty),
            dependencies: RwLock::new(Vec::new()),
        }))
    }

    pub fn handle(&self) -> AssetHandle {
        self.0.handle
    }

    pub fn asset_type(&self) -> AssetType {
        self.0.asset_type
    }

    pub fn state(&self) -> AssetState {
        *read(&self.0.state)
    }

    pub fn set_state(&self, state: AssetState) {
        *write(&self.0.state) = state;
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == AssetState::Loaded
    }

    pub fn flags(&self) -> AssetFlags {
        *read(&self.0.flags)
    }

    pub fn insert_flags(&self, flags: AssetFlags) {
        write(&self.0.flags).insert(flags);
    }

    pub fn is_memory_only(&self) -> bool {
        self.flags().contains(AssetFlags::IS_MEMORY_ONLY)
    }

    /// Handles this asset composes, in declaration order
    pub fn dependencies(&self) -> Vec<AssetHandle> {
        read(&self.0.dependencies).clone()
    }

    pub fn set_dependencies(&self, dependencies: Vec<AssetHandle>) {
        *write(&self.0.dependencies) = dependencies;
    }

    pub fn payload(&self) -> RwLockReadGuard<'_, AssetData> {
        read(&self.0.payload)
    }

    pub fn set_payload(&self, payload: AssetData) {
        *write(&self.0.payload) = payload;
    }

    /// Drop the payload, releasing any GPU resources it holds
    pub fn take_payload(&self) -> AssetData {
        std::mem::take(&mut *write(&self.0.payload))
    }

    /// Bindless slot of a texture asset
    pub fn descriptor_index(&self) -> Option<u32> {
        match &*self.payload() {
            AssetData::Texture(texture) => texture
                .descriptor
                .as_ref()
                .and_then(|descriptor| descriptor.get()),
            _ => None,
        }
    }

    pub fn material(&self) -> Option<MaterialData> {
        match &*self.payload() {
            AssetData::Material(material) => Some(material.clone()),
            _ => None,
        }
    }

    pub fn mesh_source(&self) -> Option<MeshSourceData> {
        match &*self.payload() {
            AssetData::MeshSource(mesh_source) => Some(mesh_source.clone()),
            _ => None,
        }
    }

    pub fn scene(&self) -> Option<SceneData> {
        match &*self.payload() {
            AssetData::Scene(scene) => Some(scene.clone()),
            _ => None,
        }
    }
}
