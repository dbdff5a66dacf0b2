pub use super::binding::{BindingSetItem, BindingSlotType};
pub use super::command_list::{Command, CommandList};
pub use super::descriptor_table::{
    BindlessAllocator, BindlessHandle, DescriptorTableId, GpuDescriptorTable, SharedBindlessTable,
};
pub use super::device::{GpuDevice, upload_texture};
pub use super::error::RenderError;
pub use super::headless::HeadlessDevice;
pub use super::texture::{Format, GpuTexture, ResourceState, TextureDesc, TextureHandle};
