//! Declarative parameter schema
//!
//! A filter declares its parameters once. The schema provides the default
//! [`Arguments`] for a fresh pipeline node and checks supplied arguments
//! before `validate` runs, so filters can read arguments with the typed
//! getters and treat failures as programming errors rather than user input.

use crate::result::Diagnostic;
use serde::{Deserialize, Serialize};
use tessera_core::{Arguments, DataObjectType, DataPath, Value, ValueKind};
use tessera_storage::DataStructure;

/// Code for a missing argument
pub const MISSING_ARGUMENT: i32 = -200;
/// Code for an argument of the wrong kind
pub const WRONG_ARGUMENT_KIND: i32 = -201;
/// Code for an argument outside its declared range or choices
pub const ARGUMENT_OUT_OF_RANGE: i32 = -202;
/// Code for a path argument that does not resolve or has the wrong type
pub const BAD_PATH_ARGUMENT: i32 = -203;

/// What a parameter accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// `true` / `false`
    Bool,
    /// Integer with optional inclusive bounds
    Integer {
        /// Lower bound
        min: Option<i64>,
        /// Upper bound
        max: Option<i64>,
    },
    /// Float with optional inclusive bounds
    Float {
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },
    /// Fixed-length list of floats
    FloatVector {
        /// Required number of entries
        len: usize,
    },
    /// Free text
    String,
    /// One of a fixed set of strings
    Choice(Vec<String>),
    /// Scalar kind
    DataType,
    /// Tuple or component shape
    Shape,
    /// Path that must resolve when the filter is validated
    ExistingPath {
        /// Object types accepted; empty accepts any
        allowed: Vec<DataObjectType>,
    },
    /// List of paths that must all resolve when the filter is validated
    ExistingPaths {
        /// Object types accepted; empty accepts any
        allowed: Vec<DataObjectType>,
    },
    /// Path of an object the filter creates
    CreatedPath,
}

impl ParameterKind {
    /// Value kind an argument for this parameter must be readable as
    pub fn value_kind(&self) -> ValueKind {
        match self {
            ParameterKind::Bool => ValueKind::Bool,
            ParameterKind::Integer { .. } => ValueKind::Int,
            ParameterKind::Float { .. } => ValueKind::Float,
            ParameterKind::FloatVector { .. } => ValueKind::Array,
            ParameterKind::String | ParameterKind::Choice(_) => ValueKind::String,
            ParameterKind::DataType => ValueKind::DataType,
            ParameterKind::Shape => ValueKind::Shape,
            ParameterKind::ExistingPath { .. } | ParameterKind::CreatedPath => ValueKind::Path,
            ParameterKind::ExistingPaths { .. } => ValueKind::Paths,
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Argument name
    pub name: String,
    /// Label for front ends
    pub human_name: String,
    /// Help text
    pub help: String,
    /// Accepted values
    pub kind: ParameterKind,
    /// Default value
    pub default: Value,
}

impl Parameter {
    /// Declare a parameter
    pub fn new(
        name: impl Into<String>,
        human_name: impl Into<String>,
        help: impl Into<String>,
        kind: ParameterKind,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            human_name: human_name.into(),
            help: help.into(),
            kind,
            default: default.into(),
        }
    }

    fn check(&self, value: &Value, ds: &DataStructure) -> Option<Diagnostic> {
        let name = &self.name;
        if !value.is_compatible_with(self.kind.value_kind()) {
            return Some(Diagnostic::new(
                WRONG_ARGUMENT_KIND,
                format!(
                    "argument '{}' expected {}, found {}",
                    name,
                    self.kind.value_kind(),
                    value.kind()
                ),
            ));
        }
        let out_of_range = |detail: String| {
            Some(Diagnostic::new(
                ARGUMENT_OUT_OF_RANGE,
                format!("argument '{}' {}", name, detail),
            ))
        };
        match &self.kind {
            ParameterKind::Integer { min, max } => {
                let v = value.as_int()?;
                if min.map_or(false, |min| v < min) || max.map_or(false, |max| v > max) {
                    return out_of_range(format!("{} outside [{:?}, {:?}]", v, min, max));
                }
            }
            ParameterKind::Float { min, max } => {
                let v = value.as_float()?;
                if min.map_or(false, |min| v < min) || max.map_or(false, |max| v > max) {
                    return out_of_range(format!("{} outside [{:?}, {:?}]", v, min, max));
                }
            }
            ParameterKind::FloatVector { len } => {
                let items = match value {
                    Value::Array(items) => items,
                    _ => return None,
                };
                if items.len() != *len || items.iter().any(|v| v.as_float().is_none()) {
                    return out_of_range(format!("must hold {} numbers", len));
                }
            }
            ParameterKind::Choice(choices) => {
                let v = value.as_str()?;
                if !choices.iter().any(|c| c == v) {
                    return out_of_range(format!("'{}' is not one of {:?}", v, choices));
                }
            }
            ParameterKind::ExistingPath { allowed } => {
                return check_existing(name, &path_of(value)?, allowed, ds);
            }
            ParameterKind::ExistingPaths { allowed } => {
                return paths_of(value)?
                    .iter()
                    .find_map(|path| check_existing(name, path, allowed, ds));
            }
            _ => {}
        }
        None
    }
}

fn check_existing(
    name: &str,
    path: &DataPath,
    allowed: &[DataObjectType],
    ds: &DataStructure,
) -> Option<Diagnostic> {
    let object = match ds.get_by_path(path) {
        Ok(object) => object,
        Err(e) => {
            return Some(Diagnostic::new(
                BAD_PATH_ARGUMENT,
                format!("argument '{}': {}", name, e),
            ))
        }
    };
    if !allowed.is_empty() && !allowed.contains(&object.object_type()) {
        return Some(Diagnostic::new(
            BAD_PATH_ARGUMENT,
            format!(
                "argument '{}': {} is a {}, expected one of {:?}",
                name,
                path,
                object.object_type(),
                allowed
            ),
        ));
    }
    None
}

fn paths_of(value: &Value) -> Option<Vec<DataPath>> {
    match value {
        Value::Paths(paths) => Some(paths.clone()),
        Value::Array(items) => items.iter().map(path_of).collect(),
        _ => None,
    }
}

fn path_of(value: &Value) -> Option<DataPath> {
    match value {
        Value::Path(p) => Some(p.clone()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Ordered parameter schema of a filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    list: Vec<Parameter>,
}

impl Parameters {
    /// Empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder style)
    pub fn with(mut self, parameter: Parameter) -> Self {
        self.insert(parameter);
        self
    }

    /// Add a parameter, replacing one with the same name
    pub fn insert(&mut self, parameter: Parameter) {
        match self.list.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => *existing = parameter,
            None => self.list.push(parameter),
        }
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.list.iter().find(|p| p.name == name)
    }

    /// Parameters in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.list.iter()
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// True if nothing is declared
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Arguments holding every default value
    pub fn default_arguments(&self) -> Arguments {
        self.list
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect()
    }

    /// Check supplied arguments against the schema
    ///
    /// Reports missing arguments, arguments of the wrong kind, values outside
    /// their declared range and existing-path arguments that do not resolve
    /// in `ds`. Arguments without a declared parameter are ignored.
    pub fn check(&self, args: &Arguments, ds: &DataStructure) -> Vec<Diagnostic> {
        self.list
            .iter()
            .filter_map(|p| match args.get(&p.name) {
                None => Some(Diagnostic::new(
                    MISSING_ARGUMENT,
                    format!("missing argument '{}'", p.name),
                )),
                Some(value) => p.check(value, ds),
            })
            .collect()
    }
}
