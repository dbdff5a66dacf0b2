use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobsError {
    #[error("Task graph contains a cycle, {remaining} tasks can never run")]
    Cycle { remaining: usize },
    #[error("Task {0} does not exist in the graph")]
    UnknownTask(usize),
    #[error(transparent)]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}
