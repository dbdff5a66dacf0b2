use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Command list {0} is not open for recording")]
    CommandListClosed(u64),
    #[error("Command list {0} was submitted while still open")]
    CommandListOpen(u64),
    #[error("Unknown descriptor table {0}")]
    UnknownDescriptorTable(u64),
    #[error("Descriptor index {index} is out of bounds for table of capacity {capacity}")]
    DescriptorOutOfBounds { index: u32, capacity: u32 },
    #[error("Texture upload of {got} bytes does not match the expected {expected} bytes")]
    UploadSizeMismatch { expected: usize, got: usize },
}
