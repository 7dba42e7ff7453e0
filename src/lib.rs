//! Tessera - path-addressed data graph and filter engine
//!
//! Tessera holds scientific datasets as a graph of named objects (groups,
//! attribute matrices, geometries and typed arrays) and transforms them
//! with filters. A filter first validates against the graph and declares
//! the structure it will create; the driver applies those declarations and
//! only then lets the filter fill its buffers, optionally in parallel.
//!
//! # Quick Start
//!
//! ```ignore
//! use tessera::{run_filter, Arguments, CancelFlag, CreateDataArrayFilter, DataStructure, DataType,
//!     Filter, TracingMessageHandler};
//!
//! let mut ds = DataStructure::new();
//! let args = CreateDataArrayFilter
//!     .parameters()
//!     .default_arguments()
//!     .with("data_type", DataType::Float32)
//!     .with("tuple_shape", vec![100usize])
//!     .with("output_path", "Values");
//!
//! let report = run_filter(
//!     &CreateDataArrayFilter,
//!     &mut ds,
//!     &args,
//!     &TracingMessageHandler::default(),
//!     &CancelFlag::new(),
//! );
//! assert!(report.is_completed());
//! ```
//!
//! # Architecture
//!
//! - `tessera-core`: paths, element kinds, argument values, cancellation
//! - `tessera-storage`: buffers and the data graph
//! - `tessera-concurrency`: chunked data-parallel and task-parallel dispatch
//! - `tessera-engine`: actions, the filter contract, the driver and pipelines
//!
//! The member crates are re-exported here both as modules and, for the
//! common types, at the crate root.

pub use tessera_concurrency as concurrency;
pub use tessera_engine as engine;
pub use tessera_storage as storage;

pub use tessera_core::{
    dispatch_data_type, shape_size, Arguments, CancelFlag, DataId, DataObjectType, DataPath,
    DataType, Error, Result, Scalar, Shape, Value, ValueKind, PATH_SEPARATOR,
};

pub use tessera_storage::{
    AnyDataStore, DataObject, DataObjectKind, DataStore, DataStructure, GeometryData,
    GeometryKind, ImageGeometry,
};

pub use tessera_concurrency::{
    DispatchOutcome, ParallelConfig, ParallelDataAlgorithm, ParallelTaskAlgorithm,
};

pub use tessera_engine::filters::{
    core_filters, ConvertDataTypeFilter, CopyDataObjectFilter, CreateDataArrayFilter,
    CreateImageGeometryFilter, DeleteDataFilter, FindFeatureStatisticsFilter,
    RenameDataObjectFilter,
};
pub use tessera_engine::{
    run_filter, Action, ActionMode, Completion, DeleteMode, Diagnostic, EngineConfig, Filter,
    FilterError, FilterRegistry, FilterReport, FilterRunner, FilterState, MessageCollector,
    MessageHandler, MessageKind, NullMessageHandler, OutputActions, Parameters, Pipeline,
    PipelineNode, TracingMessageHandler, ValidationResult,
};
