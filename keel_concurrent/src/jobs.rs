use crate::error::JobsError;
use crate::task_graph::TaskGraph;
use crossbeam_channel::{Receiver, Sender};
use serde::Deserialize;
use std::sync::Arc;

/// A continuation waiting for the main context
pub type MainThreadTask = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobsDesc {
    pub worker_threads: usize,
    pub thread_name: String,
}

impl Default for JobsDesc {
    fn default() -> Self {
        Self {
            worker_threads: std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(4),
            thread_name: String::from("keel-worker"),
        }
    }
}

impl JobsDesc {
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }
}

struct JobsInner {
    pool: rayon::ThreadPool,
    main_send: Sender<MainThreadTask>,
    main_recv: Receiver<MainThreadTask>,
}

/// Handle to the worker pool and the main-context queue. Clones share both.
#[derive(Clone)]
pub struct Jobs {
    inner: Arc<JobsInner>,
}

impl std::fmt::Debug for Jobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jobs")
            .field("workers", &self.inner.pool.current_num_threads())
            .field("main_queue", &self.inner.main_recv.len())
            .finish()
    }
}

impl Jobs {
    pub fn new(desc: JobsDesc) -> Result<Self, JobsError> {
        let thread_name = desc.thread_name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(desc.worker_threads)
            .thread_name(move |i| format!("{thread_name}-{i}"))
            .panic_handler(|_| tracing::error!("Worker task panicked"))
            .build()?;
        let (main_send, main_recv) = crossbeam_channel::unbounded();
        Ok(Self {
            inner: Arc::new(JobsInner {
                pool,
                main_send,
                main_recv,
            }),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.inner.pool.current_num_threads()
    }

    /// Run `task` on the worker pool without waiting for it
    pub fn submit_task<F: FnOnce() + Send + 'static>(&self, task: F) {
        self.inner.pool.spawn(task);
    }

    /// Queue `task` for the next [`Jobs::run_main_thread_tasks`]
    pub fn submit_to_main_thread<F: FnOnce() + Send + 'static>(&self, task: F) {
        if self.inner.main_send.send(Box::new(task)).is_err() {
            tracing::error!("Main thread queue is closed, dropping continuation");
        }
    }

    pub fn pending_main_thread_tasks(&self) -> usize {
        self.inner.main_recv.len()
    }

    /// Drain the main-context queue, running continuations in submission order.
    ///
    /// Only the context that owns the GPU may call this. Continuations queued while draining
    /// run in the same call.
    pub fn run_main_thread_tasks(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.inner.main_recv.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Run `graph` on the worker pool and block until it finishes
    pub fn run_graph(&self, graph: TaskGraph) -> Result<(), JobsError> {
        graph.run(&self.inner.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    fn jobs() -> Jobs {
        Jobs::new(JobsDesc::default().with_worker_threads(2)).unwrap()
    }

    #[test]
    fn test_main_thread_tasks_wait_for_drain() {
        let jobs = jobs();
        let ran = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let ran = ran.clone();
            jobs.submit_to_main_thread(move || {
                ran.lock().unwrap().push((i, std::thread::current().id()))
            });
        }
        assert!(ran.lock().unwrap().is_empty());
        assert_eq!(jobs.pending_main_thread_tasks(), 3);

        assert_eq!(jobs.run_main_thread_tasks(), 3);
        let ran = ran.lock().unwrap();
        let current = std::thread::current().id();
        assert_eq!(
            *ran,
            vec![(0, current), (1, current), (2, current)]
        );
    }

    #[test]
    fn test_worker_hands_off_to_main_thread() {
        let jobs = jobs();
        let (send, recv) = crossbeam_channel::bounded(1);
        let main = jobs.clone();
        jobs.submit_task(move || {
            let worker = std::thread::current().id();
            main.submit_to_main_thread(move || {
                send.send((worker, std::thread::current().id())).unwrap();
            });
        });

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let (worker, main_thread) = loop {
            jobs.run_main_thread_tasks();
            if let Ok(threads) = recv.try_recv() {
                break threads;
            }
            assert!(std::time::Instant::now() < deadline, "continuation never ran");
            std::thread::sleep(Duration::from_millis(1));
        };
        assert_ne!(worker, main_thread);
        assert_eq!(main_thread, std::thread::current().id());
    }

    #[test]
    fn test_workers_are_named() {
        let jobs = Jobs::new(JobsDesc {
            worker_threads: 1,
            thread_name: String::from("decode"),
        })
        .unwrap();
        let (send, recv) = crossbeam_channel::bounded(1);
        jobs.submit_task(move || {
            send.send(std::thread::current().name().map(String::from))
                .unwrap();
        });
        let name = recv.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("decode-0"));
    }
}
