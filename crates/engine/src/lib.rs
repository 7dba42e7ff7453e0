//! Filter engine for tessera
//!
//! This crate runs computations over the data graph:
//! - Action / OutputActions: declarative structural changes
//! - ValidationResult: actions plus warnings and errors from validation
//! - Filter: the two-phase validate/execute contract
//! - driver: the per-run state machine (FilterState, run_filter)
//! - Parameters: argument schema with defaults and checking
//! - FilterRegistry: uuid and name lookup of filter prototypes
//! - Pipeline: ordered filter runs with whole-pipeline preflight
//! - EngineConfig: `tessera.toml` settings and the worker pool
//!
//! Only the driver mutates the graph structure; filters describe what they
//! need and fill the buffers afterwards.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod config;
pub mod driver;
pub mod error;
pub mod filter;
pub mod filters;
pub mod message;
pub mod parameters;
pub mod pipeline;
pub mod registry;
pub mod result;

pub use action::{
    Action, ActionMode, DeleteMode, DEFAULT_CONNECTIVITY_NAME, DEFAULT_VERTEX_LIST_NAME,
};
pub use config::{EngineConfig, CONFIG_FILE_NAME};
pub use driver::{run_filter, FilterReport, FilterRun, FilterRunner, FilterState, TransitionError};
pub use error::{FilterError, FilterResult};
pub use filter::{Completion, Filter};
pub use message::{
    Message, MessageCollector, MessageHandler, MessageKind, NullMessageHandler, ProgressReporter,
    TracingMessageHandler, DEFAULT_PROGRESS_INTERVAL,
};
pub use parameters::{Parameter, ParameterKind, Parameters};
pub use pipeline::{Pipeline, PipelineNode, PipelinePreflight, PipelineReport};
pub use registry::FilterRegistry;
pub use result::{ApplyError, Diagnostic, OutputActions, ValidationResult};
