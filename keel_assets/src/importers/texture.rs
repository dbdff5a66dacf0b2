use super::decoder::{DecodedImage, DefaultImageDecoder, ImageDecoder};
use crate::asset::{Asset, AssetData, TextureData};
use crate::asset_type::AssetType;
use crate::handle::AssetHandle;
use crate::importer::AssetImporter;
use crate::manager::AssetManager;
use crate::metadata::{AssetMetadata, AssetState, path_to_string};
use anyhow::{Context, Result};
use derivative::Derivative;
use keel_concurrent::prelude::PendingTask;
use keel_render::prelude::{
    BindingSetItem, BindlessHandle, Format, TextureDesc, TextureHandle, upload_texture,
};
use std::sync::Arc;

/// Create the GPU texture for `image`. Safe on any thread.
pub fn create_gpu_texture(
    ctx: &AssetManager,
    image: &DecodedImage,
    name: &str,
) -> Result<TextureHandle> {
    ctx.device()
        .create_texture(
            &TextureDesc::new(image.width, image.height, Format::Rgba8Unorm)
                .with_debug_name(name),
        )
        .with_context(|| format!("Creating texture {name}"))
}

/// Upload `image` into `texture` and bind it into the bindless table. Main context only.
pub fn finalize_texture(
    ctx: &AssetManager,
    asset: &Asset,
    texture: TextureHandle,
    image: &DecodedImage,
) -> Result<()> {
    upload_texture(ctx.device().as_ref(), &texture, &image.pixels, image.row_pitch())?;
    ctx.device().run_garbage_collection();
    let descriptor = BindlessHandle::new(ctx.bindless_table(), BindingSetItem::texture_srv(&texture));
    asset.set_payload(AssetData::Texture(TextureData {
        texture,
        width: image.width,
        height: image.height,
        descriptor: Some(descriptor),
    }));
    Ok(())
}

/// Decode and create the texture on the current worker, then queue the upload for the main
/// context. `guard` is released once the upload has run or the import has failed.
pub(crate) fn prepare_and_queue_upload(
    ctx: &AssetManager,
    asset: Asset,
    name: &str,
    guard: PendingTask,
    decode: impl FnOnce() -> Result<DecodedImage>,
) {
    let prepared = decode().and_then(|image| {
        let texture = create_gpu_texture(ctx, &image, name)?;
        Ok((texture, image))
    });
    match prepared {
        Ok((texture, image)) => {
            let weak = ctx.downgrade();
            ctx.jobs().submit_to_main_thread(move || {
                if let Some(ctx) = weak.upgrade() {
                    ctx.finish_async(&asset, |ctx, asset| {
                        finalize_texture(ctx, asset, texture, &image)
                    });
                }
                drop(guard);
            });
        }
        Err(e) => {
            ctx.discard_async(&asset, e.context(format!("Importing texture {name}")));
            drop(guard);
        }
    }
}

/// Image files to 2D textures
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TextureImporter {
    #[derivative(Debug = "ignore")]
    decoder: Arc<dyn ImageDecoder>,
}

impl Default for TextureImporter {
    fn default() -> Self {
        Self::new(Arc::new(DefaultImageDecoder))
    }
}

impl TextureImporter {
    pub fn new(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self { decoder }
    }
}

impl AssetImporter for TextureImporter {
    fn import(
        &self,
        ctx: &AssetManager,
        handle: AssetHandle,
        metadata: &AssetMetadata,
    ) -> Result<Asset> {
        let path = ctx.resolve_path(metadata);
        let bytes = std::fs::read(&path).with_context(|| format!("Reading {}", path.display()))?;
        let image = self.decoder.decode(&bytes)?;
        let name = path_to_string(&metadata.file_path);
        let texture = create_gpu_texture(ctx, &image, &name)?;

        let asset = Asset::new(handle, AssetType::Texture2D);
        finalize_texture(ctx, &asset, texture, &image)?;
        asset.set_state(AssetState::Loaded);
        Ok(asset)
    }

    fn supports_async(&self) -> bool {
        true
    }

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
        let decoder = self.decoder.clone();
        let asset = placeholder.clone();
        let name = path_to_string(&metadata.file_path);
        ctx.jobs().submit_task(move || {
            let Some(ctx) = weak.upgrade() else {
                return;
            };
            prepare_and_queue_upload(&ctx, asset, &name, guard, || {
                let bytes =
                    std::fs::read(&path).with_context(|| format!("Reading {}", path.display()))?;
                decoder.decode(&bytes)
            });
        });
        Ok(())
    }
}
