use crate::asset::{Asset, AssetData, SceneData};
use crate::asset_type::AssetType;
use crate::handle::AssetHandle;
use crate::importer::AssetImporter;
use crate::manager::AssetManager;
use crate::metadata::{AssetMetadata, AssetState};
use anyhow::{Context, Result};

/// JSON scene documents. The document is kept as-is; interpreting it is up to the scene layer.
#[derive(Debug, Default, Copy, Clone)]
pub struct SceneImporter;

impl AssetImporter for SceneImporter {
    fn import(
        &self,
        ctx: &AssetManager,
        handle: AssetHandle,
        metadata: &AssetMetadata,
    ) -> Result<Asset> {
        let path = ctx.resolve_path(metadata);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Reading {}", path.display()))?;
        let document: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Parsing scene {}", path.display()))?;

        let asset = Asset::new(handle, AssetType::Scene);
        asset.set_payload(AssetData::Scene(SceneData { document }));
        asset.set_state(AssetState::Loaded);
        Ok(asset)
    }

    fn save(&self, ctx: &AssetManager, asset: &Asset, metadata: &AssetMetadata) -> Result<()> {
        let scene = asset.scene().context("Asset holds no scene")?;
        let path = ctx.resolve_path(metadata);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&scene.document)?)
            .with_context(|| format!("Writing {}", path.display()))
    }

    fn create(
        &self,
        ctx: &AssetManager,
        handle: AssetHandle,
        metadata: &AssetMetadata,
    ) -> Result<Asset> {
        let path = ctx.resolve_path(metadata);
        anyhow::ensure!(!path.exists(), "{} already exists", path.display());
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Scene");
        let document = serde_json::json!({ "name": name, "entities": [] });

        let asset = Asset::new(handle, AssetType::Scene);
        asset.set_payload(AssetData::Scene(SceneData { document }));
        self.save(ctx, &asset, metadata)?;
        asset.set_state(AssetState::Loaded);
        Ok(asset)
    }
}
