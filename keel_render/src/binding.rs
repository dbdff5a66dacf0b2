use crate::texture::TextureHandle;
use keel_containers::prelude::DescriptorContent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingSlotType {
    #[default]
    None,
    TextureSrv,
    TextureUav,
}

/// One entry of the bindless table.
///
/// The default item is the empty binding written into freed slots. Holding the texture here
/// keeps it alive for as long as the slot is allocated.
#[derive(Debug, Clone, Default)]
pub struct BindingSetItem {
    pub slot_type: BindingSlotType,
    pub resource: Option<TextureHandle>,
    pub mip_level: u32,
}

impl BindingSetItem {
    pub fn texture_srv(texture: &TextureHandle) -> Self {
        Self {
            slot_type: BindingSlotType::TextureSrv,
            resource: Some(texture.clone()),
            mip_level: 0,
        }
    }

    pub fn texture_uav(texture: &TextureHandle, mip_level: u32) -> Self {
        Self {
            slot_type: BindingSlotType::TextureUav,
            resource: Some(texture.clone()),
            mip_level,
        }
    }

    pub fn resource_id(&self) -> Option<u64> {
        self.resource.as_ref().map(|texture| texture.id)
    }
}

impl DescriptorContent for BindingSetItem {
    type Key = (BindingSlotType, Option<u64>, u32);

    fn key(&self) -> Self::Key {
        (self.slot_type, self.resource_id(), self.mip_level)
    }
}
