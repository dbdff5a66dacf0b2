mod common;

use common::Fixture;
use keel_assets::prelude::*;

#[test]
fn test_import_registers_and_persists() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;

    let handle = manager.import_asset("cube.png", true);
    assert!(handle.is_valid());
    assert_eq!(manager.asset_type(handle), AssetType::Texture2D);
    assert!(manager.is_asset_loaded(handle));
    assert_eq!(
        manager.asset_file_system_path(handle),
        Some(fixture.dir.path().join("cube.png"))
    );

    let entries = fixture.persisted_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["filePath"], "cube.png");
    assert_eq!(entries[0]["type"], "Texture2D");
    assert_eq!(entries[0]["handle"].as_u64(), Some(handle.raw()));
}

#[test]
fn test_import_same_path_twice() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;

    let first = manager.import_asset("textures/grass.png", false);
    let second = manager.import_asset("textures/grass.png", true);
    assert_eq!(first, second);
    // a differently spelled but equal path resolves to the same entry
    let third = manager.import_asset("textures/./grass.png", false);
    assert_eq!(first, third);
    assert_eq!(fixture.persisted_entries().len(), 1);
    assert_eq!(manager.registered_assets(), vec![first]);
}

#[test]
fn test_failed_import_leaves_nothing_behind() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;

    let result = manager.try_import_asset("broken.png", true);
    assert!(matches!(result, Err(AssetError::ImportFailure { .. })));
    assert_eq!(
        manager.asset_handle_from_file_path("broken.png"),
        AssetHandle::NULL
    );
    assert!(manager.registered_assets().is_empty());
    assert!(manager.loaded_assets().is_empty());
}

#[test]
fn test_unsupported_types() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;

    assert!(matches!(
        manager.try_import_asset("notes.txt", false),
        Err(AssetError::UnsupportedType(_))
    ));
    assert_eq!(manager.import_asset("notes.txt", false), AssetHandle::NULL);

    // registered fine, but nothing can load it
    std::fs::write(fixture.dir.path().join("font.ttf"), b"font").unwrap();
    let font = manager.import_asset("font.ttf", false);
    assert!(font.is_valid());
    assert!(matches!(
        manager.try_get_asset(font),
        Err(AssetError::UnsupportedType(_))
    ));
    assert!(manager.get_asset(font).is_none());
}

#[test]
fn test_unknown_handle() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;
    let handle = AssetHandle::new();

    assert!(!manager.is_asset_handle_valid(handle));
    assert!(!manager.is_asset_handle_valid(AssetHandle::NULL));
    assert_eq!(manager.asset_type(handle), AssetType::None);
    assert!(matches!(
        manager.try_get_asset(handle),
        Err(AssetError::NotFound(_))
    ));
    assert!(!manager.remove_asset(handle));
}

#[test]
fn test_change_path_keeps_type() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;
    let handle = manager.import_asset("cube.png", false);
    let other = manager.import_asset("textures/grass.png", false);

    assert!(manager.change_asset_path(handle, "textures/renamed.png"));
    let metadata = manager.metadata(handle).unwrap();
    assert_eq!(metadata.asset_type, AssetType::Texture2D);
    assert_eq!(
        manager.asset_handle_from_file_path("textures/renamed.png"),
        handle
    );
    assert_eq!(
        manager.asset_handle_from_file_path("cube.png"),
        AssetHandle::NULL
    );

    // path owned by someone else
    assert!(matches!(
        manager.try_change_asset_path(handle, "textures/grass.png"),
        Err(AssetError::AlreadyRegistered { .. })
    ));
    assert_eq!(
        manager.asset_handle_from_file_path("textures/grass.png"),
        other
    );
}

#[test]
fn test_update_metadata() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;
    let handle = manager.import_asset("cube.png", false);
    let other = manager.import_asset("textures/grass.png", false);

    assert!(manager.update_metadata(
        handle,
        AssetMetadata::new("textures/cube.png", AssetType::Texture2D)
    ));
    assert_eq!(
        manager.asset_handle_from_file_path("textures/cube.png"),
        handle
    );

    // a conflicting update leaves the previous metadata in place
    assert!(!manager.update_metadata(
        handle,
        AssetMetadata::new("textures/grass.png", AssetType::Texture2D)
    ));
    assert_eq!(
        manager.asset_handle_from_file_path("textures/cube.png"),
        handle
    );
    assert_eq!(
        manager.asset_handle_from_file_path("textures/grass.png"),
        other
    );
}

#[test]
fn test_registry_survives_restart() {
    let fixture = Fixture::new(ImportMode::Sync);
    let texture = fixture.manager.import_asset("cube.png", false);
    let mesh = fixture.manager.import_asset("model.gltf", false);
    let Fixture { dir, manager, .. } = fixture;
    drop(manager);

    let fixture = Fixture::in_dir(dir, ImportMode::Sync);
    let manager = &fixture.manager;
    assert_eq!(manager.asset_handle_from_file_path("cube.png"), texture);
    assert_eq!(manager.asset_handle_from_file_path("model.gltf"), mesh);
    assert_eq!(manager.asset_type(mesh), AssetType::MeshSource);
    assert!(manager.loaded_assets().is_empty());
    assert!(manager.get_asset(texture).unwrap().is_loaded());
}

#[test]
fn test_missing_files_are_pruned() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;
    manager.import_asset("cube.png", false);
    let grass = manager.import_asset("textures/grass.png", false);
    assert_eq!(fixture.persisted_entries().len(), 2);

    std::fs::remove_file(fixture.dir.path().join("cube.png")).unwrap();
    assert!(manager.serialize());
    let entries = fixture.persisted_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["handle"].as_u64(), Some(grass.raw()));
}

#[test]
fn test_get_or_make_copies_once() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;
    let source_dir = tempfile::tempdir().unwrap();
    common::write_png(source_dir.path(), "external.png", [0, 0, 255, 255]);
    let source = source_dir.path().join("external.png");

    let handle = manager.get_or_make_asset(&source, "imported/external.png", false);
    assert!(handle.is_valid());
    assert!(fixture.dir.path().join("imported/external.png").exists());
    assert_eq!(
        manager.get_or_make_asset(&source, "imported/external.png", true),
        handle
    );
    assert!(manager.get_asset(handle).unwrap().is_loaded());
}

#[test]
fn test_create_and_save_scene() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;

    let handle = manager.create_asset("levels/main.scene");
    assert!(handle.is_valid());
    let path = fixture.dir.path().join("levels/main.scene");
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["name"], "main");
    // creating over an existing file fails
    assert_eq!(manager.create_asset("levels/main.scene"), AssetHandle::NULL);

    let scene = manager.get_asset(handle).unwrap();
    assert!(scene.is_loaded());
    scene.set_payload(AssetData::Scene(SceneData {
        document: serde_json::json!({ "name": "main", "entities": ["camera"] }),
    }));
    assert!(manager.save_asset(handle));
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["entities"][0], "camera");

    let events = fixture.events.drain();
    assert!(events.contains(&AssetEvent::Created(handle)));
    assert!(events.contains(&AssetEvent::Saved(handle)));
}

#[test]
fn test_memory_only_assets_are_not_saved() {
    let fixture = Fixture::new(ImportMode::Sync);
    let manager = &fixture.manager;
    let asset = Asset::new(AssetHandle::new(), AssetType::Material);
    assert!(manager.mark_as_memory_only(&asset, AssetType::Material));

    assert!(manager.is_memory_only(asset.handle()));
    assert_eq!(manager.asset_file_system_path(asset.handle()), None);
    assert!(matches!(
        manager.try_save_asset(asset.handle()),
        Err(AssetError::MemoryOnly(_))
    ));
    assert!(matches!(
        manager.try_reload_asset(asset.handle()),
        Err(AssetError::MemoryOnly(_))
    ));
    assert!(manager.serialize());
    assert!(fixture.persisted_entries().is_empty());
}
