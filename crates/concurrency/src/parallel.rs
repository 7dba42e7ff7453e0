//! Data-parallel dispatch
//!
//! [`ParallelDataAlgorithm`] splits an index range into contiguous chunks and
//! runs a functor once per chunk on a rayon pool, then waits for every chunk
//! (fan-in). The shared [`CancelFlag`] is polled before each chunk starts; a
//! chunk that sees the flag set is skipped. Functors poll the same flag inside
//! their own loops.
//!
//! ## Chunking
//!
//! | Setting | Chunk count |
//! |---------|-------------|
//! | default | `threads * 4`, lowered so every chunk holds at least `min_grain_size` indices |
//! | `with_grain_size(g)` | as default with `g` as the grain |
//! | `with_chunk_count(n)` | `n` |
//!
//! The count is always clamped to `1..=len`, so no chunk is empty. With
//! parallelism disabled the same chunks run in order on the calling thread.
//!
//! ## Scoped settings
//!
//! [`ParallelConfig::install`] makes a config current on the calling thread
//! for the duration of a closure, the way `ThreadPool::install` does for a
//! pool. [`ParallelDataAlgorithm::new`] starts from the current config, so
//! kernels honour the settings of whoever runs them without threading a
//! config through every call.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tessera_core::{CancelFlag, Error, Result};
use tracing::{debug, warn};

/// Default minimum number of indices per chunk
pub const DEFAULT_MIN_GRAIN_SIZE: usize = 256;

/// Chunks per worker thread when no count is requested
const CHUNKS_PER_THREAD: usize = 4;

thread_local! {
    static CURRENT: RefCell<Option<ParallelConfig>> = const { RefCell::new(None) };
}

/// Restores the previously installed config when dropped
struct Restore(Option<ParallelConfig>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

/// Parallel execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Run chunks on the pool; `false` runs them in order on the caller
    pub enabled: bool,
    /// Worker thread cap, `None` for rayon's default
    pub max_threads: Option<usize>,
    /// Minimum indices per chunk for the default chunking
    pub min_grain_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_threads: None,
            min_grain_size: DEFAULT_MIN_GRAIN_SIZE,
        }
    }
}

impl ParallelConfig {
    /// Settings for a sequential run
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Config installed on this thread, or the default
    pub fn current() -> Self {
        CURRENT.with(|current| current.borrow().clone()).unwrap_or_default()
    }

    /// Run `job` with this config current on the calling thread
    ///
    /// The previous config comes back when `job` returns or unwinds. Worker
    /// threads spawned by `job` do not inherit it.
    pub fn install<R>(&self, job: impl FnOnce() -> R) -> R {
        let previous = CURRENT.with(|current| current.borrow_mut().replace(self.clone()));
        let _restore = Restore(previous);
        job()
    }

    /// Build a dedicated pool honouring `max_threads`
    ///
    /// Returns `None` when parallelism is disabled or the pool cannot be
    /// built; callers then fall back to rayon's global pool or to a
    /// sequential run.
    pub fn build_pool(&self) -> Option<Arc<ThreadPool>> {
        if !self.enabled {
            return None;
        }
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("tessera-worker-{}", i));
        if let Some(max_threads) = self.max_threads {
            builder = builder.num_threads(max_threads);
        }
        match builder.build() {
            Ok(pool) => Some(Arc::new(pool)),
            Err(e) => {
                warn!(target: "tessera::parallel", error = %e, "thread pool creation failed");
                None
            }
        }
    }
}

/// How a dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every chunk ran and the flag was never raised
    Completed {
        /// Number of chunks run
        chunks: usize,
    },
    /// The flag was raised; some chunks may have been skipped
    Cancelled {
        /// Chunks whose functor was invoked
        chunks_started: usize,
        /// Chunks planned
        chunks_total: usize,
    },
}

impl DispatchOutcome {
    /// True if the dispatch was not cancelled
    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed { .. })
    }

    /// True if the cancel flag was observed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchOutcome::Cancelled { .. })
    }

    /// Number of chunks whose functor was invoked
    pub fn chunks_started(&self) -> usize {
        match self {
            DispatchOutcome::Completed { chunks } => *chunks,
            DispatchOutcome::Cancelled { chunks_started, .. } => *chunks_started,
        }
    }

    pub(crate) fn from_counts(cancel: &CancelFlag, started: usize, total: usize) -> Self {
        if cancel.is_cancelled() {
            DispatchOutcome::Cancelled {
                chunks_started: started,
                chunks_total: total,
            }
        } else {
            DispatchOutcome::Completed { chunks: started }
        }
    }
}

/// Run `job` on the given pool, or on rayon's global pool
pub(crate) fn install<R: Send>(pool: Option<&ThreadPool>, job: impl FnOnce() -> R + Send) -> R {
    match pool {
        Some(pool) => pool.install(job),
        None => job(),
    }
}

/// Chunked, cancellable parallel loop over an index range
#[derive(Debug, Clone)]
pub struct ParallelDataAlgorithm {
    range: Range<usize>,
    config: ParallelConfig,
    grain_size: Option<usize>,
    chunk_count: Option<usize>,
    pool: Option<Arc<ThreadPool>>,
}

impl ParallelDataAlgorithm {
    /// Dispatch over `range` with the [current](ParallelConfig::current) settings
    pub fn new(range: Range<usize>) -> Self {
        Self {
            range,
            config: ParallelConfig::current(),
            grain_size: None,
            chunk_count: None,
            pool: None,
        }
    }

    /// Use the given settings
    pub fn with_config(mut self, config: ParallelConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the minimum indices per chunk
    pub fn with_grain_size(mut self, grain_size: usize) -> Self {
        self.grain_size = Some(grain_size.max(1));
        self
    }

    /// Request an exact number of chunks (clamped to the range length)
    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = Some(chunk_count.max(1));
        self
    }

    /// Run on a dedicated pool instead of rayon's global pool
    pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Range being dispatched
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    fn threads(&self) -> usize {
        let available = match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        };
        match self.config.max_threads {
            Some(max) => available.min(max.max(1)),
            None => available,
        }
    }

    /// Contiguous, non-empty sub-ranges covering the range exactly once
    pub fn chunks(&self) -> Vec<Range<usize>> {
        let len = self.range.len();
        if len == 0 {
            return Vec::new();
        }
        let count = match self.chunk_count {
            Some(n) => n,
            None => {
                let grain = self.grain_size.unwrap_or(self.config.min_grain_size).max(1);
                let by_grain = (len + grain - 1) / grain;
                (self.threads() * CHUNKS_PER_THREAD).min(by_grain)
            }
        }
        .clamp(1, len);

        let start = self.range.start;
        (0..count)
            .map(|i| start + i * len / count..start + (i + 1) * len / count)
            .collect()
    }

    fn is_parallel(&self) -> bool {
        self.config.enabled
    }

    /// Invoke `functor` once per chunk and wait for all of them
    ///
    /// Panics raised by the functor propagate to the caller after the other
    /// chunks have finished.
    pub fn execute<F>(&self, functor: F, cancel: &CancelFlag) -> DispatchOutcome
    where
        F: Fn(Range<usize>, &CancelFlag) + Sync,
    {
        let chunks = self.chunks();
        let total = chunks.len();
        let started = AtomicUsize::new(0);
        debug!(target: "tessera::parallel", range = ?self.range, chunks = total, parallel = self.is_parallel(), "dispatch");

        let run = |chunk: Range<usize>| {
            if cancel.is_cancelled() {
                return;
            }
            started.fetch_add(1, Ordering::Relaxed);
            functor(chunk, cancel);
        };
        if self.is_parallel() {
            install(self.pool.as_deref(), || chunks.into_par_iter().for_each(run));
        } else {
            chunks.into_iter().for_each(run);
        }

        DispatchOutcome::from_counts(cancel, started.load(Ordering::Relaxed), total)
    }

    /// Invoke `functor` once per chunk with that chunk's tuples of `data`
    ///
    /// `data` holds `components` elements per index of the range. Each call
    /// receives the chunk's index range and the matching disjoint sub-slice.
    pub fn execute_mut<T, F>(
        &self,
        data: &mut [T],
        components: usize,
        functor: F,
        cancel: &CancelFlag,
    ) -> Result<DispatchOutcome>
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T], &CancelFlag) + Sync,
    {
        let expected = self.range.len() * components;
        if data.len() != expected {
            return Err(Error::ShapeMismatch {
                expected: vec![self.range.len(), components],
                actual: vec![data.len()],
            });
        }

        let chunks = self.chunks();
        let total = chunks.len();
        let mut parts = Vec::with_capacity(total);
        let mut rest = data;
        for chunk in chunks {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(chunk.len() * components);
            parts.push((chunk, head));
            rest = tail;
        }

        let started = AtomicUsize::new(0);
        let run = |(chunk, slice): (Range<usize>, &mut [T])| {
            if cancel.is_cancelled() {
                return;
            }
            started.fetch_add(1, Ordering::Relaxed);
            functor(chunk, slice, cancel);
        };
        if self.is_parallel() {
            install(self.pool.as_deref(), || parts.into_par_iter().for_each(run));
        } else {
            parts.into_iter().for_each(run);
        }

        Ok(DispatchOutcome::from_counts(
            cancel,
            started.load(Ordering::Relaxed),
            total,
        ))
    }
}
