//! A device that executes nothing and remembers everything.

use crate::binding::BindingSetItem;
use crate::command_list::{Command, CommandList};
use crate::descriptor_table::DescriptorTableId;
use crate::device::GpuDevice;
use crate::error::RenderError;
use crate::texture::{GpuTexture, ResourceState, TextureDesc, TextureHandle};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::ThreadId;

/// A command list as seen by the device at submission time.
///
/// Only resource ids are kept so the record never extends a texture's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedCommandList {
    pub id: u64,
    pub thread: ThreadId,
    pub texture_writes: Vec<u64>,
    pub state_changes: Vec<(u64, ResourceState)>,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessState {
    pub textures_created: Vec<(u64, TextureDesc)>,
    pub executed: Vec<ExecutedCommandList>,
    /// Resource id bound at each slot of each table
    pub descriptor_tables: HashMap<DescriptorTableId, Vec<Option<u64>>>,
    pub descriptor_resizes: Vec<(DescriptorTableId, u32)>,
    pub descriptor_writes: Vec<(DescriptorTableId, u32, Option<u64>)>,
    pub garbage_collections: usize,
}

impl HeadlessState {
    /// Index into `executed` of the list that uploaded `texture`
    pub fn upload_position(&self, texture: u64) -> Option<usize> {
        self.executed
            .iter()
            .position(|list| list.texture_writes.contains(&texture))
    }
}

#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_id: AtomicU64,
    fail_texture_creation: AtomicBool,
    state: Mutex<HeadlessState>,
}

impl HeadlessDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following `create_texture` call fail
    pub fn set_fail_texture_creation(&self, fail: bool) {
        self.fail_texture_creation.store(fail, Ordering::Release);
    }

    pub fn snapshot(&self) -> HeadlessState {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl GpuDevice for HeadlessDevice {
    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureHandle> {
        if self.fail_texture_creation.load(Ordering::Acquire) {
            anyhow::bail!("Texture creation disabled on headless device");
        }
        let id = self.next_id();
        self.state().textures_created.push((id, desc.clone()));
        Ok(Arc::new(GpuTexture {
            id,
            desc: desc.clone(),
        }))
    }

    fn create_command_list(&self) -> CommandList {
        CommandList::new(self.next_id())
    }

    fn execute_command_list(&self, list: CommandList) -> Result<()> {
        if list.is_open() {
            return Err(RenderError::CommandListOpen(list.id()).into());
        }
        let mut executed = ExecutedCommandList {
            id: list.id(),
            thread: std::thread::current().id(),
            texture_writes: Vec::new(),
            state_changes: Vec::new(),
        };
        for command in list.into_commands() {
            match command {
                Command::WriteTexture { texture, .. } => executed.texture_writes.push(texture.id),
                Command::SetPermanentTextureState { texture, state } => {
                    executed.state_changes.push((texture.id, state))
                }
            }
        }
        tracing::trace!("Executed command list {}", executed.id);
        self.state().executed.push(executed);
        Ok(())
    }

    fn run_garbage_collection(&self) {
        self.state().garbage_collections += 1;
    }

    fn create_descriptor_table(&self, capacity: u32) -> Result<DescriptorTableId> {
        let id = self.next_id();
        self.state()
            .descriptor_tables
            .insert(id, vec![None; capacity as usize]);
        Ok(id)
    }

    fn resize_descriptor_table(
        &self,
        table: DescriptorTableId,
        capacity: u32,
        keep_contents: bool,
    ) -> Result<()> {
        let mut state = self.state();
        let slots = state
            .descriptor_tables
            .get_mut(&table)
            .ok_or(RenderError::UnknownDescriptorTable(table))?;
        if !keep_contents {
            slots.clear();
        }
        slots.resize(capacity as usize, None);
        state.descriptor_resizes.push((table, capacity));
        Ok(())
    }

    fn write_descriptor_table(
        &self,
        table: DescriptorTableId,
        index: u32,
        item: &BindingSetItem,
    ) -> Result<()> {
        let mut state = self.state();
        let slots = state
            .descriptor_tables
            .get_mut(&table)
            .ok_or(RenderError::UnknownDescriptorTable(table))?;
        let capacity = slots.len() as u32;
        let slot = slots
            .get_mut(index as usize)
            .ok_or(RenderError::DescriptorOutOfBounds { index, capacity })?;
        *slot = item.resource_id();
        state
            .descriptor_writes
            .push((table, index, item.resource_id()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor_table::{BindlessAllocator, BindlessHandle, GpuDescriptorTable};
    use crate::device::upload_texture;
    use crate::texture::Format;

    #[test]
    fn test_upload_is_recorded_with_thread() {
        let device = HeadlessDevice::new();
        let texture = device
            .create_texture(&TextureDesc::new(2, 1, Format::Rgba8Unorm))
            .unwrap();
        upload_texture(device.as_ref(), &texture, &[255; 8], 8).unwrap();

        let state = device.snapshot();
        assert_eq!(state.executed.len(), 1);
        assert_eq!(state.executed[0].thread, std::thread::current().id());
        assert_eq!(state.executed[0].texture_writes, vec![texture.id]);
        assert_eq!(
            state.executed[0].state_changes,
            vec![(texture.id, ResourceState::ShaderResource)]
        );
        assert_eq!(state.upload_position(texture.id), Some(0));
    }

    #[test]
    fn test_open_list_is_rejected() {
        let device = HeadlessDevice::new();
        let mut list = device.create_command_list();
        list.open();
        assert!(device.execute_command_list(list).is_err());
        assert!(device.snapshot().executed.is_empty());
    }

    #[test]
    fn test_texture_creation_failure() {
        let device = HeadlessDevice::new();
        device.set_fail_texture_creation(true);
        assert!(device.create_texture(&TextureDesc::default()).is_err());
        device.set_fail_texture_creation(false);
        assert!(device.create_texture(&TextureDesc::default()).is_ok());
    }

    #[test]
    fn test_descriptor_table_bounds() {
        let device = HeadlessDevice::new();
        let table = device.create_descriptor_table(4).unwrap();
        assert!(
            device
                .write_descriptor_table(table, 4, &BindingSetItem::default())
                .is_err()
        );
        device.resize_descriptor_table(table, 8, true).unwrap();
        device
            .write_descriptor_table(table, 4, &BindingSetItem::default())
            .unwrap();
        assert!(
            device
                .write_descriptor_table(table + 100, 0, &BindingSetItem::default())
                .is_err()
        );
    }

    #[test]
    fn test_bindless_allocator_mirrors_into_device() {
        let device = HeadlessDevice::new();
        let table = GpuDescriptorTable::new(device.clone(), 64).unwrap();
        let table_id = table.id();
        let shared = BindlessAllocator::new_shared(table);
        let texture = device.create_texture(&TextureDesc::new(1, 1, Format::Rgba8Unorm)).unwrap();

        let handle = BindlessHandle::new(&shared, BindingSetItem::texture_srv(&texture));
        let index = handle.get().unwrap();
        // a second binding of the same view shares the slot
        let same = shared
            .lock()
            .unwrap()
            .create_descriptor(BindingSetItem::texture_srv(&texture));
        assert_eq!(index, same);
        assert_eq!(Arc::strong_count(&texture), 2);
        assert_eq!(
            device.snapshot().descriptor_tables[&table_id][index as usize],
            Some(texture.id)
        );

        drop(handle);
        assert_eq!(Arc::strong_count(&texture), 1);
        assert_eq!(
            device.snapshot().descriptor_tables[&table_id][index as usize],
            None
        );
    }

    #[test]
    fn test_bindless_growth_resizes_device_table() {
        let device = HeadlessDevice::new();
        let table = GpuDescriptorTable::new(device.clone(), 64).unwrap();
        let table_id = table.id();
        let mut allocator = BindlessAllocator::new(table);
        let textures: Vec<_> = (0..65)
            .map(|_| device.create_texture(&TextureDesc::default()).unwrap())
            .collect();
        for texture in &textures {
            allocator.create_descriptor(BindingSetItem::texture_srv(texture));
        }
        let state = device.snapshot();
        assert_eq!(state.descriptor_resizes, vec![(table_id, 128)]);
        assert_eq!(state.descriptor_tables[&table_id].len(), 128);
        assert_eq!(state.descriptor_tables[&table_id][64], Some(textures[64].id));
    }
}
