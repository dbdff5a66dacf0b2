pub use super::bitset::BitSet;
pub use super::descriptor_table::{
    BindingTable, DescriptorContent, DescriptorHandle, DescriptorIndex, DescriptorTableAllocator,
    SharedDescriptorTable,
};
pub use super::error;
