use crate::binding::BindingSetItem;
use crate::command_list::CommandList;
use crate::descriptor_table::DescriptorTableId;
use crate::texture::{ResourceState, TextureDesc, TextureHandle};
use anyhow::{Context, Result};

/// The GPU device the asset system submits to.
///
/// Creation calls may come from any thread. Command list execution and descriptor table
/// mutation are expected to happen on the main context only.
pub trait GpuDevice: Send + Sync + std::fmt::Debug {
    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureHandle>;

    fn create_command_list(&self) -> CommandList;

    fn execute_command_list(&self, list: CommandList) -> Result<()>;

    /// Free resources whose last reference was dropped
    fn run_garbage_collection(&self);

    fn create_descriptor_table(&self, capacity: u32) -> Result<DescriptorTableId>;

    fn resize_descriptor_table(
        &self,
        table: DescriptorTableId,
        capacity: u32,
        keep_contents: bool,
    ) -> Result<()>;

    fn write_descriptor_table(
        &self,
        table: DescriptorTableId,
        index: u32,
        item: &BindingSetItem,
    ) -> Result<()>;
}

/// Record and submit a full texture upload, leaving the texture readable by shaders.
pub fn upload_texture(
    device: &dyn GpuDevice,
    texture: &TextureHandle,
    data: &[u8],
    row_pitch: usize,
) -> Result<()> {
    let mut list = device.create_command_list();
    list.open();
    list.write_texture(texture, data, row_pitch)
        .with_context(|| format!("Recording upload of texture {}", texture.id))?;
    list.set_permanent_texture_state(texture, ResourceState::ShaderResource)?;
    list.close();
    device
        .execute_command_list(list)
        .with_context(|| format!("Submitting upload of texture {}", texture.id))
}
