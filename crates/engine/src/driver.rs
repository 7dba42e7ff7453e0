//! Filter run driver
//!
//! Runs one filter through its lifecycle and records the states it passed:
//!
//! ```text
//! Idle → Validating ─┬→ ValidationFailed
//!                    ├→ Cancelled
//!                    └→ ValidationSucceeded → Applying ─┬→ ExecutionFailed
//!                                                      ├→ Cancelled
//!                                                      └→ Executing ─┬→ Completed
//!                                                                    ├→ ExecutionFailed
//!                                                                    └→ Cancelled
//! ```
//!
//! The graph is only mutated from `Applying` on. A run that ends in
//! `ValidationFailed`, or is cancelled while validating, leaves it untouched.
//! There is no rollback: actions applied before a failure stay applied.

use crate::action::ActionMode;
use crate::error::FilterError;
use crate::filter::{Completion, Filter};
use crate::message::{Message, MessageHandler};
use crate::result::ValidationResult;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tessera_concurrency::ParallelConfig;
use tessera_core::{Arguments, CancelFlag};
use tessera_storage::DataStructure;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Code reported when a run is driven through an impossible transition
pub const INVALID_TRANSITION: i32 = -900;

/// Lifecycle state of one filter run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterState {
    /// Not started
    Idle,
    /// Preflight running
    Validating,
    /// Preflight reported errors; graph untouched
    ValidationFailed,
    /// Preflight passed
    ValidationSucceeded,
    /// Actions being applied
    Applying,
    /// Execute running
    Executing,
    /// Finished successfully
    Completed,
    /// Apply or execute failed
    ExecutionFailed,
    /// Stopped by the cancel flag
    Cancelled,
}

impl FilterState {
    /// True for the states a run ends in
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FilterState::ValidationFailed
                | FilterState::Completed
                | FilterState::ExecutionFailed
                | FilterState::Cancelled
        )
    }

    /// True if `next` may follow `self`
    pub fn can_transition_to(&self, next: FilterState) -> bool {
        use FilterState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, ValidationFailed)
                | (Validating, ValidationSucceeded)
                | (Validating, Cancelled)
                | (ValidationSucceeded, Applying)
                | (Applying, Executing)
                | (Applying, ExecutionFailed)
                | (Applying, Cancelled)
                | (Executing, Completed)
                | (Executing, ExecutionFailed)
                | (Executing, Cancelled)
        )
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A transition the state machine does not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid filter state transition {from} -> {to}")]
pub struct TransitionError {
    /// State before
    pub from: FilterState,
    /// Requested state
    pub to: FilterState,
}

/// State machine of one run with its history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRun {
    state: FilterState,
    history: Vec<FilterState>,
}

impl FilterRun {
    /// Fresh run in `Idle`
    pub fn new() -> Self {
        Self {
            state: FilterState::Idle,
            history: vec![FilterState::Idle],
        }
    }

    /// Current state
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Every state entered, in order
    pub fn history(&self) -> &[FilterState] {
        &self.history
    }

    /// Move to `next` if the state machine allows it
    pub fn transition(&mut self, next: FilterState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.history.push(next);
        Ok(())
    }
}

impl Default for FilterRun {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened during one run
#[derive(Debug)]
pub struct FilterReport {
    /// Filter name
    pub filter: &'static str,
    /// Final state
    pub state: FilterState,
    /// States entered, in order
    pub history: Vec<FilterState>,
    /// Preflight result
    pub validation: ValidationResult,
    /// Failure, for `ExecutionFailed`
    pub error: Option<FilterError>,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl FilterReport {
    /// True if the run completed
    pub fn is_completed(&self) -> bool {
        self.state == FilterState::Completed
    }

    /// True if the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.state == FilterState::Cancelled
    }
}

/// Runs filters, optionally on a dedicated thread pool
///
/// When a pool is set, execute runs inside it so the parallel primitives
/// used by kernels pick it up instead of rayon's global pool. A parallel
/// config is installed the same way and decides how kernels chunk their
/// work and whether they run chunks on the pool at all.
#[derive(Debug, Clone, Default)]
pub struct FilterRunner {
    pool: Option<Arc<ThreadPool>>,
    parallel: Option<ParallelConfig>,
}

impl FilterRunner {
    /// Runner using rayon's global pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner installing `pool` around execute
    pub fn with_thread_pool(pool: Arc<ThreadPool>) -> Self {
        Self {
            pool: Some(pool),
            parallel: None,
        }
    }

    /// Install `config` around execute
    pub fn with_parallel_config(mut self, config: ParallelConfig) -> Self {
        self.parallel = Some(config);
        self
    }

    /// The dedicated pool, if any
    pub fn thread_pool(&self) -> Option<&Arc<ThreadPool>> {
        self.pool.as_ref()
    }

    /// Parallel settings kernels see, if the runner sets any
    pub fn parallel_config(&self) -> Option<&ParallelConfig> {
        self.parallel.as_ref()
    }

    /// Run one filter through preflight, apply and execute
    pub fn run(
        &self,
        filter: &dyn Filter,
        ds: &mut DataStructure,
        args: &Arguments,
        messages: &dyn MessageHandler,
        cancel: &CancelFlag,
    ) -> FilterReport {
        let started = Instant::now();
        let mut run = FilterRun::new();
        let mut validation = ValidationResult::ok();
        let mut error = None;

        if let Err(e) = self.drive(filter, ds, args, messages, cancel, &mut run, &mut validation, &mut error) {
            warn!(target: "tessera::driver", filter = filter.name(), error = %e, "state machine violation");
            error = Some(FilterError::execution(INVALID_TRANSITION, e.to_string()));
            run.state = FilterState::ExecutionFailed;
            run.history.push(FilterState::ExecutionFailed);
        }

        let report = FilterReport {
            filter: filter.name(),
            state: run.state(),
            history: run.history().to_vec(),
            validation,
            error,
            elapsed: started.elapsed(),
        };
        info!(
            target: "tessera::driver",
            filter = report.filter,
            state = %report.state,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "filter finished"
        );
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn drive(
        &self,
        filter: &dyn Filter,
        ds: &mut DataStructure,
        args: &Arguments,
        messages: &dyn MessageHandler,
        cancel: &CancelFlag,
        run: &mut FilterRun,
        validation: &mut ValidationResult,
        error: &mut Option<FilterError>,
    ) -> Result<(), TransitionError> {
        run.transition(FilterState::Validating)?;
        debug!(target: "tessera::driver", filter = filter.name(), "preflight");
        *validation = filter.preflight(ds, args, cancel);

        if cancel.is_cancelled() {
            messages.handle(Message::info(format!("{}: cancelled during validation", filter.name())));
            return run.transition(FilterState::Cancelled);
        }
        for warning in &validation.warnings {
            messages.handle(Message::warning(warning.to_string()));
        }
        if !validation.is_valid() {
            for e in &validation.errors {
                messages.handle(Message::error(e.to_string()));
            }
            return run.transition(FilterState::ValidationFailed);
        }
        run.transition(FilterState::ValidationSucceeded)?;

        run.transition(FilterState::Applying)?;
        if let Err(e) = validation.actions.apply_all(ds, ActionMode::Execute) {
            messages.handle(Message::error(e.to_string()));
            *error = Some(FilterError::Apply(e));
            return run.transition(FilterState::ExecutionFailed);
        }
        if cancel.is_cancelled() {
            return run.transition(FilterState::Cancelled);
        }

        run.transition(FilterState::Executing)?;
        debug!(target: "tessera::driver", filter = filter.name(), "execute");
        let mut job = || match &self.parallel {
            Some(config) => config.install(|| filter.execute(ds, args, messages, cancel)),
            None => filter.execute(ds, args, messages, cancel),
        };
        let outcome = match &self.pool {
            Some(pool) => pool.install(job),
            None => job(),
        };
        match outcome {
            Ok(Completion::Completed) if !cancel.is_cancelled() => {
                if let Err(e) = validation.actions.apply_deferred(ds, ActionMode::Execute) {
                    messages.handle(Message::error(e.to_string()));
                    *error = Some(FilterError::Apply(e));
                    return run.transition(FilterState::ExecutionFailed);
                }
                run.transition(FilterState::Completed)
            }
            Ok(_) => run.transition(FilterState::Cancelled),
            Err(e) => {
                messages.handle(Message::error(e.to_string()));
                *error = Some(e);
                run.transition(FilterState::ExecutionFailed)
            }
        }
    }
}

/// Run one filter on rayon's global pool
pub fn run_filter(
    filter: &dyn Filter,
    ds: &mut DataStructure,
    args: &Arguments,
    messages: &dyn MessageHandler,
    cancel: &CancelFlag,
) -> FilterReport {
    FilterRunner::new().run(filter, ds, args, messages, cancel)
}
