use crate::asset_type::AssetType;
use std::path::{Component, Path, PathBuf};

bitflags::bitflags! {
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct AssetFlags: u32 {
        /// No backing file, never persisted or indexed by path
        const IS_MEMORY_ONLY = 1 << 0;
    }
}

/// Progress of one load cycle. Only moves forward until the asset is reloaded.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AssetState {
    #[default]
    None,
    Loading,
    Loaded,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct AssetMetadata {
    /// Normalized path relative to the assets directory, empty for memory-only assets
    pub file_path: PathBuf,
    pub asset_type: AssetType,
}

impl AssetMetadata {
    pub fn new(file_path: impl AsRef<Path>, asset_type: AssetType) -> Self {
        Self {
            file_path: normalize_path(file_path.as_ref()),
            asset_type,
        }
    }

    pub fn memory_only(asset_type: AssetType) -> Self {
        Self {
            file_path: PathBuf::new(),
            asset_type,
        }
    }

    pub fn is_memory_only(&self) -> bool {
        self.file_path.as_os_str().is_empty()
    }
}

/// Lexically normalize a relative path: `.` is dropped and `..` cancels the previous segment.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Render a path with `/` separators regardless of platform
pub fn path_to_string(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("./textures/../textures/./cube.png")),
            PathBuf::from("textures/cube.png")
        );
        assert_eq!(
            normalize_path(Path::new("../shared/a.png")),
            PathBuf::from("../shared/a.png")
        );
        assert_eq!(normalize_path(Path::new("")), PathBuf::new());
    }

    #[test]
    fn test_memory_only_metadata() {
        let metadata = AssetMetadata::memory_only(AssetType::Material);
        assert!(metadata.is_memory_only());
        assert!(!AssetMetadata::new("a.material", AssetType::Material).is_memory_only());
    }

    #[test]
    fn test_path_to_string() {
        assert_eq!(
            path_to_string(&PathBuf::from("textures").join("cube.png")),
            "textures/cube.png"
        );
    }
}
