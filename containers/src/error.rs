use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum ContainerErrors {
    #[error("Slot index is out of range")]
    NonexistentSlot,
    #[error("Slot {0} is not allocated")]
    SlotNotAllocated(u32),
}
