use crate::binding::BindingSetItem;
use crate::device::GpuDevice;
use derivative::Derivative;
use keel_containers::prelude::{
    BindingTable, DescriptorHandle, DescriptorIndex, DescriptorTableAllocator,
    SharedDescriptorTable,
};
use std::sync::Arc;

pub type DescriptorTableId = u64;

/// The device-side table backing a [`BindlessAllocator`]
#[derive(Derivative)]
#[derivative(Debug)]
pub struct GpuDescriptorTable {
    #[derivative(Debug = "ignore")]
    device: Arc<dyn GpuDevice>,
    id: DescriptorTableId,
    capacity: u32,
}

impl GpuDescriptorTable {
    pub fn new(device: Arc<dyn GpuDevice>, capacity: u32) -> anyhow::Result<Self> {
        let id = device.create_descriptor_table(capacity)?;
        Ok(Self {
            device,
            id,
            capacity,
        })
    }

    pub fn id(&self) -> DescriptorTableId {
        self.id
    }
}

impl BindingTable<BindingSetItem> for GpuDescriptorTable {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn resize(&mut self, capacity: u32) {
        if let Err(e) = self.device.resize_descriptor_table(self.id, capacity, true) {
            tracing::error!("Failed to resize descriptor table {}: {e:?}", self.id);
        }
        self.capacity = capacity;
    }

    fn write(&mut self, index: DescriptorIndex, content: &BindingSetItem) {
        if let Err(e) = self.device.write_descriptor_table(self.id, index, content) {
            tracing::error!(
                "Failed to write descriptor {index} of table {}: {e:?}",
                self.id
            );
        }
    }
}

pub type BindlessAllocator = DescriptorTableAllocator<BindingSetItem, GpuDescriptorTable>;
pub type SharedBindlessTable = SharedDescriptorTable<BindingSetItem, GpuDescriptorTable>;
pub type BindlessHandle = DescriptorHandle<BindingSetItem, GpuDescriptorTable>;
