//! Built-in importers
pub mod decoder;
mod mesh_source;
mod scene;
mod texture;

pub use mesh_source::MeshSourceImporter;
pub use scene::SceneImporter;
pub use texture::{TextureImporter, create_gpu_texture, finalize_texture};
