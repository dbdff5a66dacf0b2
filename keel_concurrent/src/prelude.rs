pub use super::counter::{PendingTask, TaskCounter};
pub use super::error::JobsError;
pub use super::event::{EventReceiver, EventSender, event_send};
pub use super::jobs::{Jobs, JobsDesc, MainThreadTask};
pub use super::task_graph::{TaskGraph, TaskId};
