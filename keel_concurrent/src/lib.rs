//! Two-tier execution: a worker pool for CPU-bound work and a single main context that owns
//! the GPU. Work reaches the main context only through its continuation queue, which the
//! owner drains once per tick.

pub mod counter;
pub mod error;
pub mod event;
pub mod jobs;
pub mod prelude;
pub mod task_graph;
