//! GPU-side collaborators of the asset system.
//!
//! Nothing in here talks to a graphics API directly. [`device::GpuDevice`] is the seam a real
//! backend implements; [`headless::HeadlessDevice`] is a recording implementation used when no
//! GPU is around.

pub mod binding;
pub mod command_list;
pub mod descriptor_table;
pub mod device;
pub mod error;
pub mod headless;
pub mod prelude;
pub mod texture;
