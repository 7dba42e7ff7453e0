//! Concurrency layer for tessera
//!
//! This crate implements the fork-join primitives filters use inside their
//! execute step:
//! - ParallelDataAlgorithm: chunked loop over an index range
//! - ParallelTaskAlgorithm: batch of independent tasks
//! - ParallelConfig: thread and grain settings, pool construction
//!
//! Both primitives block the caller until every chunk or task has finished
//! and poll a shared `CancelFlag` before starting each one. Workers only ever
//! see disjoint index ranges or slices, never the data graph itself.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod parallel;
pub mod task;

pub use parallel::{DispatchOutcome, ParallelConfig, ParallelDataAlgorithm, DEFAULT_MIN_GRAIN_SIZE};
pub use task::{ParallelTaskAlgorithm, Task};
