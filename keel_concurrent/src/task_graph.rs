use crate::error::JobsError;
use rayon::prelude::*;

pub type TaskId = usize;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A batch of tasks with precedence edges, run to completion on a worker pool.
///
/// Tasks without a path between them run in parallel. [`TaskGraph::run`] blocks until every
/// task has finished.
#[derive(Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    successors: Vec<Vec<TaskId>>,
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.tasks.len())
            .field("successors", &self.successors)
            .finish()
    }
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn add<F: FnOnce() + Send + 'static>(&mut self, task: F) -> TaskId {
        self.tasks.push(Box::new(task));
        self.successors.push(Vec::new());
        self.tasks.len() - 1
    }

    /// `before` must finish before `after` starts
    pub fn precede(&mut self, before: TaskId, after: TaskId) -> Result<(), JobsError> {
        let len = self.tasks.len();
        for id in [before, after] {
            if id >= len {
                return Err(JobsError::UnknownTask(id));
            }
        }
        self.successors[before].push(after);
        Ok(())
    }

    /// Group tasks into levels where each level only depends on earlier ones
    fn levels(&self) -> Result<Vec<Vec<TaskId>>, JobsError> {
        let mut in_degree = vec![0usize; self.tasks.len()];
        for successors in &self.successors {
            for successor in successors {
                in_degree[*successor] += 1;
            }
        }
        let mut levels = Vec::new();
        let mut ready: Vec<TaskId> = (0..self.tasks.len())
            .filter(|id| in_degree[*id] == 0)
            .collect();
        let mut scheduled = 0;
        while !ready.is_empty() {
            scheduled += ready.len();
            let mut next = Vec::new();
            for id in &ready {
                for successor in &self.successors[*id] {
                    in_degree[*successor] -= 1;
                    if in_degree[*successor] == 0 {
                        next.push(*successor);
                    }
                }
            }
            levels.push(std::mem::replace(&mut ready, next));
        }
        if scheduled != self.tasks.len() {
            return Err(JobsError::Cycle {
                remaining: self.tasks.len() - scheduled,
            });
        }
        Ok(levels)
    }

    /// Run every task on `pool`. Nothing runs if the graph has a cycle.
    pub fn run(self, pool: &rayon::ThreadPool) -> Result<(), JobsError> {
        let levels = self.levels()?;
        let mut tasks: Vec<Option<Task>> = self.tasks.into_iter().map(Some).collect();
        for level in levels {
            let batch: Vec<Task> = level
                .into_iter()
                .filter_map(|id| tasks[id].take())
                .collect();
            pool.install(|| batch.into_par_iter().for_each(|task| task()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap()
    }

    #[test]
    fn test_join_runs_after_all_predecessors() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut graph = TaskGraph::new();
        let children: Vec<_> = (0..8)
            .map(|i| {
                let order = order.clone();
                graph.add(move || order.lock().unwrap().push(i))
            })
            .collect();
        let join = {
            let order = order.clone();
            graph.add(move || order.lock().unwrap().push(100))
        };
        for child in children {
            graph.precede(child, join).unwrap();
        }

        graph.run(&pool()).unwrap();
        let order = order.lock().unwrap();
        assert_eq!(order.len(), 9);
        assert_eq!(order.last(), Some(&100));
    }

    #[test]
    fn test_chain_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut graph = TaskGraph::new();
        let ids: Vec<_> = (0..4)
            .map(|i| {
                let order = order.clone();
                graph.add(move || order.lock().unwrap().push(i))
            })
            .collect();
        // 3 -> 2 -> 1 -> 0
        graph.precede(ids[3], ids[2]).unwrap();
        graph.precede(ids[2], ids[1]).unwrap();
        graph.precede(ids[1], ids[0]).unwrap();
        graph.run(&pool()).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_cycle_runs_nothing() {
        let ran = Arc::new(Mutex::new(0));
        let mut graph = TaskGraph::new();
        let ids: Vec<_> = (0..3)
            .map(|_| {
                let ran = ran.clone();
                graph.add(move || *ran.lock().unwrap() += 1)
            })
            .collect();
        graph.precede(ids[1], ids[2]).unwrap();
        graph.precede(ids[2], ids[1]).unwrap();
        assert!(matches!(
            graph.run(&pool()),
            Err(JobsError::Cycle { remaining: 2 })
        ));
        assert_eq!(*ran.lock().unwrap(), 0);
    }

    #[test]
    fn test_unknown_task_edge() {
        let mut graph = TaskGraph::new();
        let a = graph.add(|| {});
        assert!(matches!(
            graph.precede(a, 5),
            Err(JobsError::UnknownTask(5))
        ));
    }
}
