//! The filter contract
//!
//! A filter transforms the data graph in two strictly ordered steps:
//!
//! ```text
//! preflight (validate) → apply actions → execute
//! ```
//!
//! - `validate` sees the graph read-only and describes the structural change
//!   it needs as [`Action`](crate::Action)s. It must not mutate anything and
//!   must be deterministic for the same graph and arguments.
//! - `execute` runs after the driver has applied those actions. It fills the
//!   buffers the actions created and may read anything else in the graph.
//!
//! # Contract
//!
//! Filters MUST NOT:
//! - Change structure in `execute` beyond what validation declared
//! - Keep graph references across calls
//! - Block without polling the cancel flag
//!
//! The driver in [`crate::driver`] enforces the ordering; see
//! [`FilterState`](crate::FilterState) for the state machine.

use crate::error::FilterResult;
use crate::message::MessageHandler;
use crate::parameters::Parameters;
use crate::result::ValidationResult;
use tessera_core::{Arguments, CancelFlag};
use tessera_storage::DataStructure;
use uuid::Uuid;

/// How an execute step ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// All work done
    Completed,
    /// Stopped early after observing the cancel flag
    Cancelled,
}

/// A unit of computation over the data graph
pub trait Filter: Send + Sync {
    /// Stable machine name
    fn name(&self) -> &'static str;

    /// Implementation type name
    fn class_name(&self) -> &'static str;

    /// Stable identity
    fn uuid(&self) -> Uuid;

    /// Label for front ends
    fn human_name(&self) -> &'static str;

    /// Search tags
    fn default_tags(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Declared parameters
    fn parameters(&self) -> Parameters;

    /// Boxed copy of this filter
    fn clone_filter(&self) -> Box<dyn Filter>;

    /// Describe the structural change this run will make
    ///
    /// Must not mutate `ds`. Faults are reported as diagnostics in the
    /// returned result.
    fn validate(&self, ds: &DataStructure, args: &Arguments, cancel: &CancelFlag)
        -> ValidationResult;

    /// Fill the buffers created by the validated actions
    fn execute(
        &self,
        ds: &mut DataStructure,
        args: &Arguments,
        messages: &dyn MessageHandler,
        cancel: &CancelFlag,
    ) -> FilterResult<Completion>;

    /// Check `args` against [`parameters`](Self::parameters), then validate
    ///
    /// Argument problems short-circuit: `validate` only runs on arguments
    /// that passed the schema.
    fn preflight(&self, ds: &DataStructure, args: &Arguments, cancel: &CancelFlag) -> ValidationResult {
        let errors = self.parameters().check(args, ds);
        if !errors.is_empty() {
            return ValidationResult {
                errors,
                ..ValidationResult::ok()
            };
        }
        self.validate(ds, args, cancel)
    }
}

impl Clone for Box<dyn Filter> {
    fn clone(&self) -> Self {
        self.clone_filter()
    }
}

impl std::fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name())
            .field("uuid", &self.uuid())
            .finish()
    }
}
