//! Bindless descriptor table bookkeeping.
//!
//! [`DescriptorTableAllocator`] hands out stable slot indices into a GPU-visible table whose
//! storage lives elsewhere (see [`BindingTable`]). Identical contents are deduplicated, freed
//! slots are reused lowest-first, and the table doubles when it runs out of room.
//!
//! The allocator itself is not synchronized. It is meant to be owned by the context that
//! issues GPU work; [`SharedDescriptorTable`] only exists so [`DescriptorHandle`] can hold a
//! weak back reference to it.

use crate::bitset::BitSet;
use crate::error::ContainerErrors;
use derivative::Derivative;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, Weak};

pub type DescriptorIndex = u32;

/// Smallest capacity the table grows to when it is full
pub const MIN_GROWTH_CAPACITY: u32 = 64;

/// Content that can be stored in a descriptor slot.
///
/// `Default` must produce the empty ("none") binding; it is what freed and freshly grown slots
/// hold. Holding a value in a slot is what keeps the external resource referenced, so dropping
/// the value must release it.
pub trait DescriptorContent: Clone + Default {
    /// Identity used for deduplication. Two contents with equal keys share one slot.
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
}

/// The GPU-visible side of the table that every slot write is mirrored into.
pub trait BindingTable<C> {
    fn capacity(&self) -> u32;

    /// Grow the table to `capacity`, keeping existing entries
    fn resize(&mut self, capacity: u32);

    fn write(&mut self, index: DescriptorIndex, content: &C);
}

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct DescriptorTableAllocator<C: DescriptorContent, B: BindingTable<C>> {
    #[derivative(Debug = "ignore")]
    table: B,
    allocated: BitSet,
    #[derivative(Debug = "ignore")]
    descriptors: Vec<C>,
    #[derivative(Debug = "ignore")]
    index_map: HashMap<C::Key, DescriptorIndex>,
    /// Live [`DescriptorHandle`]s per slot
    handle_counts: Vec<u32>,
    search_start: DescriptorIndex,
}

/// Shared ownership of an allocator, the strong side of [`DescriptorHandle`]'s weak reference
pub type SharedDescriptorTable<C, B> = Arc<Mutex<DescriptorTableAllocator<C, B>>>;

impl<C: DescriptorContent, B: BindingTable<C>> DescriptorTableAllocator<C, B> {
    pub fn new(table: B) -> Self {
        let capacity = table.capacity();
        let mut descriptors = Vec::new();
        descriptors.resize_with(capacity as usize, C::default);
        Self {
            table,
            allocated: BitSet::with_len(capacity),
            descriptors,
            index_map: HashMap::new(),
            handle_counts: vec![0; capacity as usize],
            search_start: 0,
        }
    }

    pub fn new_shared(table: B) -> SharedDescriptorTable<C, B> {
        Arc::new(Mutex::new(Self::new(table)))
    }

    pub fn capacity(&self) -> u32 {
        self.allocated.len()
    }

    pub fn allocated_count(&self) -> u32 {
        self.allocated.count_ones()
    }

    pub fn is_allocated(&self, index: DescriptorIndex) -> bool {
        self.allocated.contains(index)
    }

    pub fn table(&self) -> &B {
        &self.table
    }

    /// Get the slot's content. Out of range indices yield `None`.
    pub fn get_descriptor(&self, index: DescriptorIndex) -> Option<&C> {
        self.descriptors.get(index as usize)
    }

    /// Place `content` in a slot and return its index.
    ///
    /// If equal content already occupies a slot, that index is returned and nothing is
    /// allocated or referenced.
    pub fn create_descriptor(&mut self, content: C) -> DescriptorIndex {
        let key = content.key();
        if let Some(index) = self.index_map.get(&key) {
            return *index;
        }

        let index = match self.allocated.first_clear_from(self.search_start) {
            Some(index) => index,
            None => {
                let capacity = self.capacity();
                self.grow(MIN_GROWTH_CAPACITY.max(capacity.saturating_mul(2)));
                capacity
            }
        };

        self.search_start = index + 1;
        self.allocated.set(index);
        self.descriptors[index as usize] = content;
        self.index_map.insert(key, index);
        self.table.write(index, &self.descriptors[index as usize]);
        index
    }

    /// Free a slot, dropping its content and writing the empty binding in its place.
    pub fn release_descriptor(&mut self, index: DescriptorIndex) -> Result<(), ContainerErrors> {
        if index >= self.capacity() {
            return Err(ContainerErrors::NonexistentSlot);
        }
        if !self.allocated.contains(index) {
            return Err(ContainerErrors::SlotNotAllocated(index));
        }

        let released = std::mem::take(&mut self.descriptors[index as usize]);
        let key = released.key();
        if self.index_map.get(&key) == Some(&index) {
            self.index_map.remove(&key);
        }
        drop(released);

        self.table.write(index, &self.descriptors[index as usize]);
        self.handle_counts[index as usize] = 0;
        self.allocated.clear(index);
        self.search_start = self.search_start.min(index);
        Ok(())
    }

    fn grow(&mut self, new_capacity: u32) {
        tracing::debug!(
            "Growing descriptor table {} -> {}",
            self.capacity(),
            new_capacity
        );
        self.table.resize(new_capacity);
        self.allocated.resize(new_capacity);
        self.descriptors.resize_with(new_capacity as usize, C::default);
        self.handle_counts.resize(new_capacity as usize, 0);
    }

    /// Create (or dedup onto) a slot and count one more handle owning it
    fn acquire(&mut self, content: C) -> DescriptorIndex {
        let index = self.create_descriptor(content);
        self.handle_counts[index as usize] += 1;
        index
    }

    /// Drop one handle's claim on `index`, releasing the slot once no handle is left
    fn release_handle(&mut self, index: DescriptorIndex) -> Result<(), ContainerErrors> {
        if !self.allocated.contains(index) {
            return Err(ContainerErrors::SlotNotAllocated(index));
        }
        let count = &mut self.handle_counts[index as usize];
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.release_descriptor(index)?;
        }
        Ok(())
    }
}

/// Owns one slot of a shared allocator and frees it on drop.
///
/// Handles whose content deduplicates onto the same slot share it; the slot is released when
/// the last of them drops.
///
/// Only a weak reference to the allocator is kept, so a handle that outlives its allocator
/// simply skips the release.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct DescriptorHandle<C: DescriptorContent, B: BindingTable<C>> {
    #[derivative(Debug = "ignore")]
    manager: Weak<Mutex<DescriptorTableAllocator<C, B>>>,
    index: Option<DescriptorIndex>,
}

impl<C: DescriptorContent, B: BindingTable<C>> Default for DescriptorHandle<C, B> {
    fn default() -> Self {
        Self {
            manager: Weak::new(),
            index: None,
        }
    }
}

impl<C: DescriptorContent, B: BindingTable<C>> DescriptorHandle<C, B> {
    /// Allocate (or reuse) a slot for `content` in `table`
    pub fn new(table: &SharedDescriptorTable<C, B>, content: C) -> Self {
        let index = table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .acquire(content);
        Self {
            manager: Arc::downgrade(table),
            index: Some(index),
        }
    }

    /// Slot index, `None` for an empty handle
    pub fn get(&self) -> Option<DescriptorIndex> {
        debug_assert!(
            self.index.is_none() || self.manager.strong_count() > 0,
            "descriptor handle outlived its table"
        );
        self.index
    }

    pub fn is_valid(&self) -> bool {
        self.index.is_some() && self.manager.strong_count() > 0
    }
}

impl<C: DescriptorContent, B: BindingTable<C>> Drop for DescriptorHandle<C, B> {
    fn drop(&mut self) {
        let Some(index) = self.index.take() else {
            return;
        };
        if let Some(manager) = self.manager.upgrade() {
            let mut manager = manager.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = manager.release_handle(index) {
                tracing::warn!("Failed to release descriptor {index}: {e}");
            }
        }
    }
}
