#![allow(dead_code)]

use anyhow::Result;
use keel_assets::prelude::*;
use keel_concurrent::prelude::{EventReceiver, Jobs, JobsDesc};
use keel_render::prelude::HeadlessDevice;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const MESH_TEXTURES: usize = 3;
pub const MESH_MATERIALS: usize = 2;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

pub fn write_png(dir: &Path, name: &str, color: [u8; 4]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, png_bytes(4, 4, color)).unwrap();
}

/// Hands back a fixed model with embedded textures, so mesh imports need no real glTF
pub struct FakeMeshDecoder;

impl MeshSourceDecoder for FakeMeshDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedMeshSource> {
        anyhow::ensure!(path.exists(), "missing {}", path.display());
        let textures = (0..MESH_TEXTURES)
            .map(|i| EmbeddedTexture {
                name: format!("texture_{i}"),
                bytes: png_bytes(2, 2, [i as u8 * 60, 0, 0, 255]),
            })
            .collect();
        Ok(DecodedMeshSource {
            name: String::from("model"),
            materials: vec![
                DecodedMaterial {
                    name: Some(String::from("body")),
                    base_color: [1.0, 1.0, 1.0, 1.0],
                    base_texture: Some(0),
                    uv_set: 0,
                },
                DecodedMaterial {
                    name: None,
                    base_color: [0.5, 0.5, 0.5, 1.0],
                    base_texture: Some(2),
                    uv_set: 1,
                },
            ],
            textures,
            mesh_count: 2,
            node_count: 3,
        })
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub device: Arc<HeadlessDevice>,
    pub manager: AssetManager,
    pub events: EventReceiver<AssetEvent>,
}

impl Fixture {
    pub fn new(import_mode: ImportMode) -> Self {
        Self::in_dir(tempfile::tempdir().unwrap(), import_mode)
    }

    pub fn in_dir(dir: TempDir, import_mode: ImportMode) -> Self {
        init_tracing();
        write_png(dir.path(), "cube.png", [255, 0, 0, 255]);
        write_png(dir.path(), "textures/grass.png", [0, 255, 0, 255]);
        std::fs::write(dir.path().join("model.gltf"), "{}").unwrap();
        std::fs::write(dir.path().join("broken.png"), b"definitely not a png").unwrap();

        let device = HeadlessDevice::new();
        let jobs = Jobs::new(JobsDesc::default().with_worker_threads(2)).unwrap();
        let desc = AssetManagerDesc::in_directory(dir.path()).with_import_mode(import_mode);
        let manager = AssetManager::new(desc, device.clone(), jobs).unwrap();
        manager.register_importer(
            AssetType::MeshSource,
            Arc::new(MeshSourceImporter::new(
                Arc::new(DefaultImageDecoder),
                Arc::new(FakeMeshDecoder),
            )),
        );
        let (subscriber, events) = AssetEvent::channel();
        manager.subscribe(Arc::new(subscriber));
        Self {
            dir,
            device,
            manager,
            events,
        }
    }

    pub fn registry_document(&self) -> serde_json::Value {
        let text = std::fs::read_to_string(self.dir.path().join("AssetRegistry.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    pub fn persisted_entries(&self) -> Vec<serde_json::Value> {
        self.registry_document()["metaMap"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }

    pub fn wait(&self) {
        assert!(
            self.manager
                .wait_for_async_tasks_timeout(Duration::from_secs(10)),
            "asynchronous imports did not finish"
        );
    }

    /// Poll without pumping the main queue
    pub fn wait_for_pending(&self, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while self.manager.pending_async_tasks() != count {
            assert!(
                Instant::now() < deadline,
                "pending tasks stuck at {}",
                self.manager.pending_async_tasks()
            );
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
