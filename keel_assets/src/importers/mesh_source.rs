use super::decoder::{
    DecodedMaterial, DecodedMeshSource, DefaultImageDecoder, GltfDecoder, ImageDecoder,
    MeshSourceDecoder,
};
use super::texture::{create_gpu_texture, finalize_texture, prepare_and_queue_upload};
use crate::asset::{Asset, AssetData, MaterialData, MeshSourceData, UvSet};
use crate::asset_type::AssetType;
use crate::error::AssetError;
use crate::handle::AssetHandle;
use crate::importer::AssetImporter;
use crate::manager::AssetManager;
use crate::metadata::{AssetMetadata, AssetState};
use anyhow::{Context, Result};
use derivative::Derivative;
use keel_concurrent::prelude::TaskGraph;
use std::sync::Arc;
use std::time::Instant;

/// Mesh containers (glTF).
///
/// Embedded materials and textures become memory-only sub-assets owned by the mesh source.
/// Its dependencies are laid out as `[materials.., textures..]`.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct MeshSourceImporter {
    #[derivative(Debug = "ignore")]
    image_decoder: Arc<dyn ImageDecoder>,
    #[derivative(Debug = "ignore")]
    mesh_decoder: Arc<dyn MeshSourceDecoder>,
}

impl Default for MeshSourceImporter {
    fn default() -> Self {
        Self::new(Arc::new(DefaultImageDecoder), Arc::new(GltfDecoder))
    }
}

fn material_data(
    material: &DecodedMaterial,
    dependencies: &[AssetHandle],
    material_count: usize,
) -> MaterialData {
    MaterialData {
        name: material
            .name
            .clone()
            .unwrap_or_else(|| String::from("Unnamed Material")),
        base_color: material.base_color,
        base_texture: material
            .base_texture
            .and_then(|index| dependencies.get(material_count + index))
            .copied()
            .unwrap_or_default(),
        uv_set: if material.uv_set == 0 {
            UvSet::Uv0
        } else {
            UvSet::Uv1
        },
    }
}

fn mesh_source_data(decoded: &DecodedMeshSource) -> MeshSourceData {
    MeshSourceData {
        name: decoded.name.clone(),
        material_count: decoded.materials.len() as u32,
        texture_count: decoded.textures.len() as u32,
        mesh_count: decoded.mesh_count,
        node_count: decoded.node_count,
    }
}

/// Register every material as a loaded memory-only asset in the leading dependency slots.
/// Texture slots must already be filled in.
fn append_materials(
    ctx: &AssetManager,
    decoded: &DecodedMeshSource,
    dependencies: &mut [AssetHandle],
) -> Result<(), AssetError> {
    let material_count = decoded.materials.len();
    for (i, material) in decoded.materials.iter().enumerate() {
        let asset = Asset::new(AssetHandle::new(), AssetType::Material);
        let data = material_data(material, dependencies, material_count);
        tracing::trace!("Import memory-only material {}", data.name);
        asset.set_payload(AssetData::Material(data));
        asset.set_state(AssetState::Loaded);
        ctx.adopt_memory_asset(&asset)?;
        dependencies[i] = asset.handle();
        ctx.notify_loaded(&asset);
    }
    Ok(())
}

/// Runs after every texture continuation, so each sub-asset is either loaded or was discarded
fn check_dependencies(ctx: &AssetManager, parent: &Asset) -> Result<()> {
    let failed = parent
        .dependencies()
        .into_iter()
        .filter(|dependency| !ctx.is_asset_loaded(*dependency))
        .count();
    anyhow::ensure!(failed == 0, "{failed} sub-assets failed to import");
    Ok(())
}

impl MeshSourceImporter {
    pub fn new(
        image_decoder: Arc<dyn ImageDecoder>,
        mesh_decoder: Arc<dyn MeshSourceDecoder>,
    ) -> Self {
        Self {
            image_decoder,
            mesh_decoder,
        }
    }

    /// Import every embedded texture in place, filling the texture dependency slots
    fn import_textures(
        &self,
        ctx: &AssetManager,
        decoded: &DecodedMeshSource,
        dependencies: &mut [AssetHandle],
    ) -> Result<()> {
        let material_count = decoded.materials.len();
        for (i, embedded) in decoded.textures.iter().enumerate() {
            let asset = Asset::new(AssetHandle::new(), AssetType::Texture2D);
            ctx.adopt_memory_asset(&asset)?;
            dependencies[material_count + i] = asset.handle();

            let image = self
                .image_decoder
                .decode(&embedded.bytes)
                .with_context(|| format!("Decoding texture {}", embedded.name))?;
            let texture = create_gpu_texture(ctx, &image, &embedded.name)?;
            finalize_texture(ctx, &asset, texture, &image)?;
            asset.set_state(AssetState::Loaded);
            ctx.notify_loaded(&asset);
        }
        Ok(())
    }
}

impl AssetImporter for MeshSourceImporter {
    fn import(
        &self,
        ctx: &AssetManager,
        handle: AssetHandle,
        metadata: &AssetMetadata,
    ) -> Result<Asset> {
        let path = ctx.resolve_path(metadata);
        anyhow::ensure!(path.exists(), "File {} does not exist", path.display());
        let start = Instant::now();
        let decoded = self.mesh_decoder.decode(&path)?;

        let mut dependencies =
            vec![AssetHandle::NULL; decoded.materials.len() + decoded.textures.len()];
        let result = self
            .import_textures(ctx, &decoded, &mut dependencies)
            .and_then(|()| {
                append_materials(ctx, &decoded, &mut dependencies).map_err(anyhow::Error::from)
            });
        if let Err(e) = result {
            // sub-assets created so far die with the failed import
            for dependency in dependencies.iter().filter(|handle| handle.is_valid()) {
                ctx.unload_asset(*dependency);
            }
            return Err(e);
        }
        tracing::debug!(
            "Imported {} textures and {} materials of {} [{} ms]",
            decoded.textures.len(),
            decoded.materials.len(),
            path.display(),
            start.elapsed().as_millis()
        );

        let asset = Asset::new(handle, AssetType::MeshSource);
        asset.set_dependencies(dependencies);
        asset.set_payload(AssetData::MeshSource(mesh_source_data(&decoded)));
        asset.set_state(AssetState::Loaded);
        Ok(asset)
    }

    fn supports_async(&self) -> bool {
        true
    }

    /// Decode on a worker, then fan the embedded textures out as a task graph. Every texture
    /// task queues its own upload; a join task after all of them queues the mesh source's
    /// completion, so the main context finishes every texture before the parent. A single
    /// failed texture fails the whole mesh source.
    fn import_async(
        &self,
        ctx: &AssetManager,
        placeholder: &Asset,
        metadata: &AssetMetadata,
    ) -> Result<()> {
        let path = ctx.resolve_path(metadata);
        anyhow::ensure!(path.exists(), "File {} does not exist", path.display());

        let guard = ctx.begin_task();
        let weak = ctx.downgrade();
        let image_decoder = self.image_decoder.clone();
        let mesh_decoder = self.mesh_decoder.clone();
        let parent = placeholder.clone();
        ctx.jobs().submit_task(move || {
            let Some(ctx) = weak.upgrade() else {
                return;
            };
            let decoded = match mesh_decoder.decode(&path) {
                Ok(decoded) => decoded,
                Err(e) => {
                    ctx.discard_async(&parent, e);
                    return;
                }
            };

            if !ctx.cache().holds(&parent) {
                tracing::trace!(
                    "Mesh source {} left the cache while decoding, skipping sub-assets",
                    parent.handle()
                );
                return;
            }

            let material_count = decoded.materials.len();
            let mut dependencies =
                vec![AssetHandle::NULL; material_count + decoded.textures.len()];
            let mut graph = TaskGraph::new();
            let mut texture_tasks = Vec::with_capacity(decoded.textures.len());
            for (i, embedded) in decoded.textures.iter().enumerate() {
                let asset = Asset::new(AssetHandle::new(), AssetType::Texture2D);
                if let Err(e) = ctx.adopt_memory_asset(&asset) {
                    tracing::error!("Skipping texture {}: {e}", embedded.name);
                    continue;
                }
                dependencies[material_count + i] = asset.handle();

                let task_guard = ctx.begin_task();
                let weak = ctx.downgrade();
                let decoder = image_decoder.clone();
                let embedded = embedded.clone();
                texture_tasks.push(graph.add(move || {
                    let Some(ctx) = weak.upgrade() else {
                        return;
                    };
                    prepare_and_queue_upload(&ctx, asset, &embedded.name, task_guard, || {
                        decoder.decode(&embedded.bytes)
                    });
                }));
            }

            if let Err(e) = append_materials(&ctx, &decoded, &mut dependencies) {
                tracing::error!("Failed to import materials of {}: {e}", path.display());
            }
            parent.set_dependencies(dependencies);
            parent.set_payload(AssetData::MeshSource(mesh_source_data(&decoded)));

            let weak = ctx.downgrade();
            let join = graph.add(move || {
                let Some(ctx) = weak.upgrade() else {
                    return;
                };
                let weak = ctx.downgrade();
                ctx.jobs().submit_to_main_thread(move || {
                    if let Some(ctx) = weak.upgrade() {
                        ctx.finish_async(&parent, check_dependencies);
                    }
                    drop(guard);
                });
            });
            for task in texture_tasks {
                if let Err(e) = graph.precede(task, join) {
                    tracing::error!("Failed to order texture upload: {e}");
                }
            }
            if let Err(e) = ctx.jobs().run_graph(graph) {
                tracing::error!("Mesh source import of {} failed: {e}", path.display());
            }
        });
        Ok(())
    }
}
