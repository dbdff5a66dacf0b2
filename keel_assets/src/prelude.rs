pub use super::asset::{
    Asset, AssetData, MaterialData, MeshSourceData, SceneData, TextureData, UvSet,
};
pub use super::asset_type::AssetType;
pub use super::desc::{AssetManagerDesc, ImportMode};
pub use super::error::AssetError;
pub use super::handle::AssetHandle;
pub use super::importer::AssetImporter;
pub use super::importers::decoder::{
    DecodedImage, DecodedMaterial, DecodedMeshSource, DefaultImageDecoder, EmbeddedTexture,
    GltfDecoder, ImageDecoder, MeshSourceDecoder,
};
pub use super::importers::{MeshSourceImporter, SceneImporter, TextureImporter};
pub use super::manager::{AssetManager, WeakAssetManager};
pub use super::metadata::{AssetFlags, AssetMetadata, AssetState};
pub use super::subscriber::{AssetEvent, AssetEventCallback, ChannelSubscriber, SubscriberHandle};
