use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Rgba8Unorm,
    Rgba32Float,
}

impl Format {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Format::Rgba8Unorm => 4,
            Format::Rgba32Float => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Common,
    CopyDest,
    ShaderResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub debug_name: String,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32, format: Format) -> Self {
        Self {
            width,
            height,
            format,
            debug_name: String::new(),
        }
    }

    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = name.into();
        self
    }

    /// Tightly packed size of one row
    pub fn row_pitch(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel() as usize
    }

    pub fn size_in_bytes(&self) -> usize {
        self.row_pitch() * self.height as usize
    }
}

/// A texture owned by a [`crate::device::GpuDevice`].
///
/// The id is unique per device and is what descriptor deduplication keys on.
#[derive(Debug, PartialEq, Eq)]
pub struct GpuTexture {
    pub id: u64,
    pub desc: TextureDesc,
}

/// Textures are shared between assets and descriptor slots; the last clone frees the texture.
pub type TextureHandle = Arc<GpuTexture>;
