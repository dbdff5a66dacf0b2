//! File format decoding behind the built-in importers.
//!
//! Importers only need pixels, material factors and texture references, so that is all the
//! decoders hand back.

use anyhow::{Context, Result};
use std::path::Path;

/// RGBA8 pixels, tightly packed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn row_pitch(&self) -> usize {
        self.width as usize * 4
    }
}

pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage>;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct DefaultImageDecoder;

impl ImageDecoder for DefaultImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let image = image::load_from_memory(bytes)
            .context("Decoding image")?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            width,
            height,
            pixels: image.into_raw(),
        })
    }
}

/// An image stored inside a mesh source, still encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedTexture {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMaterial {
    pub name: Option<String>,
    pub base_color: [f32; 4],
    /// Index into [`DecodedMeshSource::textures`]
    pub base_texture: Option<usize>,
    pub uv_set: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedMeshSource {
    pub name: String,
    pub materials: Vec<DecodedMaterial>,
    pub textures: Vec<EmbeddedTexture>,
    pub mesh_count: u32,
    pub node_count: u32,
}

pub trait MeshSourceDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedMeshSource>;
}

/// glTF and GLB mesh sources
#[derive(Debug, Default, Copy, Clone)]
pub struct GltfDecoder;

impl GltfDecoder {
    fn texture_bytes(
        image: &gltf::Image,
        buffers: &[gltf::buffer::Data],
        base: &Path,
    ) -> Result<Vec<u8>> {
        match image.source() {
            gltf::image::Source::View { view, .. } => {
                let buffer = buffers
                    .get(view.buffer().index())
                    .with_context(|| format!("Missing buffer {}", view.buffer().index()))?;
                let start = view.offset();
                let end = start + view.length();
                buffer
                    .get(start..end)
                    .map(<[u8]>::to_vec)
                    .with_context(|| format!("Buffer view {start}..{end} out of range"))
            }
            gltf::image::Source::Uri { uri, .. } => {
                if uri.starts_with("data:") {
                    anyhow::bail!("Data URI images are not supported");
                }
                let path = base.join(uri);
                std::fs::read(&path).with_context(|| format!("Reading {}", path.display()))
            }
        }
    }
}

impl MeshSourceDecoder for GltfDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedMeshSource> {
        let gltf::Gltf { document, blob } =
            gltf::Gltf::open(path).with_context(|| format!("Opening {}", path.display()))?;
        let base = path.parent().unwrap_or(Path::new(""));
        let buffers = gltf::import_buffers(&document, Some(base), blob)
            .with_context(|| format!("Loading buffers of {}", path.display()))?;

        let textures = document
            .textures()
            .map(|texture| {
                let image = texture.source();
                let name = image
                    .name()
                    .or(texture.name())
                    .unwrap_or("Unnamed")
                    .to_string();
                let bytes = Self::texture_bytes(&image, &buffers, base)
                    .with_context(|| format!("Texture {name}"))?;
                Ok(EmbeddedTexture { name, bytes })
            })
            .collect::<Result<Vec<_>>>()?;

        let materials = document
            .materials()
            .map(|material| {
                let pbr = material.pbr_metallic_roughness();
                let base_texture = pbr.base_color_texture();
                DecodedMaterial {
                    name: material.name().map(String::from),
                    base_color: pbr.base_color_factor(),
                    base_texture: base_texture.as_ref().map(|info| info.texture().index()),
                    uv_set: base_texture.map_or(0, |info| info.tex_coord()),
                }
            })
            .collect();

        Ok(DecodedMeshSource {
            name: document
                .default_scene()
                .and_then(|scene| scene.name().map(String::from))
                .unwrap_or_else(|| String::from("Model")),
            materials,
            textures,
            mesh_count: document.meshes().count() as u32,
            node_count: document.nodes().count() as u32,
        })
    }
}
