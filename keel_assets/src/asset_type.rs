use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetType {
    #[default]
    None,
    Texture2D,
    Scene,
    MeshSource,
    Material,
    PhysicsMaterial,
    AudioSource,
    AnimationClip,
    Shader,
    Font,
    Prefab,
}

impl AssetType {
    pub const COUNT: usize = 11;

    pub const ALL: [AssetType; Self::COUNT] = [
        AssetType::None,
        AssetType::Texture2D,
        AssetType::Scene,
        AssetType::MeshSource,
        AssetType::Material,
        AssetType::PhysicsMaterial,
        AssetType::AudioSource,
        AssetType::AnimationClip,
        AssetType::Shader,
        AssetType::Font,
        AssetType::Prefab,
    ];

    /// Slot in per-type tables
    pub const fn index(&self) -> usize {
        *self as usize
    }

    pub const fn name(&self) -> &'static str {
        match self {
            AssetType::None => "None",
            AssetType::Texture2D => "Texture2D",
            AssetType::Scene => "Scene",
            AssetType::MeshSource => "MeshSource",
            AssetType::Material => "Material",
            AssetType::PhysicsMaterial => "PhysicsMaterial",
            AssetType::AudioSource => "AudioSource",
            AssetType::AnimationClip => "AnimationClip",
            AssetType::Shader => "Shader",
            AssetType::Font => "Font",
            AssetType::Prefab => "Prefab",
        }
    }

    /// Resolve the type from a file extension, case-insensitively.
    ///
    /// Unknown or missing extensions give [`AssetType::None`].
    pub fn from_extension(path: &Path) -> AssetType {
        let Some(extension) = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
        else {
            return AssetType::None;
        };
        match extension.as_str() {
            "scene" => AssetType::Scene,
            "prefab" => AssetType::Prefab,
            "png" | "jpg" | "jpeg" | "hdr" | "exr" => AssetType::Texture2D,
            "glb" | "gltf" => AssetType::MeshSource,
            "mp3" | "wav" => AssetType::AudioSource,
            "material" => AssetType::Material,
            "physicsmaterial" => AssetType::PhysicsMaterial,
            "animation" => AssetType::AnimationClip,
            "hlsl" => AssetType::Shader,
            "ttf" => AssetType::Font,
            _ => AssetType::None,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown asset type {0:?}")]
pub struct UnknownAssetType(pub String);

impl FromStr for AssetType {
    type Err = UnknownAssetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .into_iter()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| UnknownAssetType(s.to_string()))
    }
}
