pub mod bitset;
pub mod descriptor_table;
pub mod error;
pub mod prelude;
