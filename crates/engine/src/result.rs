//! Validation results
//!
//! This module defines:
//! - Diagnostic: code + message reported by validation or execution
//! - OutputActions: ordered actions plus deferred actions
//! - ValidationResult: what a filter's validation step returns
//! - ApplyError: which action failed while applying a list
//!
//! A result is valid iff it carries no errors. Warnings never block a run.

use crate::action::{Action, ActionMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::Error;
use tessera_storage::DataStructure;
use thiserror::Error as ThisError;

/// One warning or error with a numeric code
///
/// Codes are negative for errors by convention; the graph's own faults use
/// [`Error::code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Numeric code
    pub code: i32,
    /// Human readable text
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&Error> for Diagnostic {
    fn from(error: &Error) -> Self {
        Diagnostic::new(error.code(), error.to_string())
    }
}

impl From<Error> for Diagnostic {
    fn from(error: Error) -> Self {
        Diagnostic::from(&error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Failure while applying an action list
#[derive(Debug, ThisError)]
#[error("action {index} ({action}) failed: {source}")]
pub struct ApplyError {
    /// Position of the failing action in its list
    pub index: usize,
    /// The failing action
    pub action: Action,
    /// Underlying graph error
    #[source]
    pub source: Error,
}

/// Actions produced by validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputActions {
    /// Applied before execute, in order
    pub actions: Vec<Action>,
    /// Applied after a successful execute, in order
    pub deferred: Vec<Action>,
}

impl OutputActions {
    /// No actions
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action applied before execute
    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Queue an action applied after execute
    pub fn push_deferred(&mut self, action: Action) {
        self.deferred.push(action);
    }

    /// Number of immediate actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if there are no actions of either kind
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.deferred.is_empty()
    }

    /// Append another list, keeping order
    pub fn extend(&mut self, other: OutputActions) {
        self.actions.extend(other.actions);
        self.deferred.extend(other.deferred);
    }

    /// Apply the immediate actions in list order
    ///
    /// Stops at the first failure. Actions before it stay applied.
    pub fn apply_all(&self, ds: &mut DataStructure, mode: ActionMode) -> Result<(), ApplyError> {
        apply_list(&self.actions, ds, mode)
    }

    /// Apply the deferred actions in list order
    pub fn apply_deferred(&self, ds: &mut DataStructure, mode: ActionMode) -> Result<(), ApplyError> {
        apply_list(&self.deferred, ds, mode)
    }
}

fn apply_list(actions: &[Action], ds: &mut DataStructure, mode: ActionMode) -> Result<(), ApplyError> {
    for (index, action) in actions.iter().enumerate() {
        action.apply(ds, mode).map_err(|source| ApplyError {
            index,
            action: action.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Outcome of a filter's validation step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Structural changes the run will make
    pub actions: OutputActions,
    /// Non-fatal findings
    pub warnings: Vec<Diagnostic>,
    /// Fatal findings; any entry blocks the run
    pub errors: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Valid result with no actions
    pub fn ok() -> Self {
        Self::default()
    }

    /// Result carrying a single error
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        let mut result = Self::ok();
        result.push_error(code, message);
        result
    }

    /// Result carrying a single graph fault
    pub fn fault(error: &Error) -> Self {
        let mut result = Self::ok();
        result.errors.push(error.into());
        result
    }

    /// Valid result with the given actions
    pub fn with_actions(actions: OutputActions) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    /// Queue an action applied before execute
    pub fn push_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Queue an action applied after execute
    pub fn push_deferred(&mut self, action: Action) {
        self.actions.push_deferred(action);
    }

    /// Record an error
    pub fn push_error(&mut self, code: i32, message: impl Into<String>) {
        self.errors.push(Diagnostic::new(code, message));
    }

    /// Record a warning
    pub fn push_warning(&mut self, code: i32, message: impl Into<String>) {
        self.warnings.push(Diagnostic::new(code, message));
    }

    /// True if no error was recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Merge another result into this one, keeping action order
    pub fn merge(&mut self, other: ValidationResult) {
        self.actions.extend(other.actions);
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }
}

impl From<Error> for ValidationResult {
    fn from(error: Error) -> Self {
        ValidationResult::fault(&error)
    }
}
