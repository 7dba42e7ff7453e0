//! Task-parallel dispatch
//!
//! [`ParallelTaskAlgorithm`] runs a batch of independent closures on the pool
//! and waits for all of them. Like the data-parallel loop, a task that finds
//! the cancel flag raised before it starts is skipped.

use crate::parallel::{install, DispatchOutcome, ParallelConfig};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tessera_core::CancelFlag;
use tracing::debug;

/// One unit of work in a task batch
pub type Task<'a> = Box<dyn FnOnce(&CancelFlag) + Send + 'a>;

/// Batch of independent tasks with a fan-in wait
pub struct ParallelTaskAlgorithm<'a> {
    tasks: Vec<Task<'a>>,
    config: ParallelConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl<'a> ParallelTaskAlgorithm<'a> {
    /// Empty batch
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            config: ParallelConfig::current(),
            pool: None,
        }
    }

    /// Use the given settings
    pub fn with_config(mut self, config: ParallelConfig) -> Self {
        self.config = config;
        self
    }

    /// Run on a dedicated pool
    pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Queue a task
    pub fn add_task(&mut self, task: impl FnOnce(&CancelFlag) + Send + 'a) {
        self.tasks.push(Box::new(task));
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if no task is queued
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every queued task and wait for all of them
    pub fn execute(self, cancel: &CancelFlag) -> DispatchOutcome {
        let total = self.tasks.len();
        let started = AtomicUsize::new(0);
        debug!(target: "tessera::parallel", tasks = total, parallel = self.config.enabled, "task batch");

        let run = |task: Task<'a>| {
            if cancel.is_cancelled() {
                return;
            }
            started.fetch_add(1, Ordering::Relaxed);
            task(cancel);
        };
        let tasks = self.tasks;
        if self.config.enabled {
            install(self.pool.as_deref(), || tasks.into_par_iter().for_each(run));
        } else {
            tasks.into_iter().for_each(run);
        }

        DispatchOutcome::from_counts(cancel, started.load(Ordering::Relaxed), total)
    }
}

impl Default for ParallelTaskAlgorithm<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParallelTaskAlgorithm<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelTaskAlgorithm")
            .field("tasks", &self.tasks.len())
            .field("config", &self.config)
            .finish()
    }
}
