use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of asynchronous tasks still in flight.
///
/// Every unit of work takes a [`PendingTask`] when it is submitted and carries it along until
/// its last continuation has run. Dropping the guard is what marks the work finished, so a task
/// whose closure is discarded without running still gets counted out.
#[derive(Debug, Clone, Default)]
pub struct TaskCounter {
    count: Arc<AtomicUsize>,
}

impl TaskCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_idle(&self) -> bool {
        self.get() == 0
    }

    pub fn begin(&self) -> PendingTask {
        self.count.fetch_add(1, Ordering::AcqRel);
        PendingTask {
            count: self.count.clone(),
        }
    }
}

#[derive(Debug)]
pub struct PendingTask {
    count: Arc<AtomicUsize>,
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_counts_out_on_drop() {
        let counter = TaskCounter::new();
        let a = counter.begin();
        let b = counter.clone().begin();
        assert_eq!(counter.get(), 2);
        drop(a);
        assert_eq!(counter.get(), 1);
        drop(b);
        assert!(counter.is_idle());
    }
}
