//! Argument values
//!
//! This module defines:
//! - Value: dynamically typed value supplied for one filter parameter
//! - ValueKind: kind tag used to declare what a parameter expects
//! - Arguments: flat name → value map handed to a filter
//!
//! ## Type Rules
//!
//! - No implicit coercions, with two exceptions for values that arrive as
//!   text or JSON numbers: a `String` is accepted where a path or a data
//!   type is expected (it is parsed), and an `Int` is accepted where a
//!   `Float` is expected.
//! - `Int(1) != Float(1.0)`

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::path::DataPath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Dynamically typed argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Path into the data graph
    Path(DataPath),
    /// List of paths into the data graph
    Paths(Vec<DataPath>),
    /// Scalar kind
    DataType(DataType),
    /// Tuple or component shape
    Shape(Vec<usize>),
    /// List of values
    Array(Vec<Value>),
}

/// Kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Float`]
    Float,
    /// [`Value::String`]
    String,
    /// [`Value::Path`]
    Path,
    /// [`Value::Paths`]
    Paths,
    /// [`Value::DataType`]
    DataType,
    /// [`Value::Shape`]
    Shape,
    /// [`Value::Array`]
    Array,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Value {
    /// Kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Path(_) => ValueKind::Path,
            Value::Paths(_) => ValueKind::Paths,
            Value::DataType(_) => ValueKind::DataType,
            Value::Shape(_) => ValueKind::Shape,
            Value::Array(_) => ValueKind::Array,
        }
    }

    /// True if this value can be read as `kind` under the coercion rules
    pub fn is_compatible_with(&self, kind: ValueKind) -> bool {
        match (self, kind) {
            (v, k) if v.kind() == k => true,
            (Value::Int(_), ValueKind::Float) => true,
            (Value::String(s), ValueKind::Path) => s.parse::<DataPath>().is_ok(),
            (Value::String(s), ValueKind::DataType) => s.parse::<DataType>().is_ok(),
            (Value::Array(items), ValueKind::Shape) => {
                items.iter().all(|v| matches!(v, Value::Int(i) if *i >= 0))
            }
            (Value::Array(items), ValueKind::Paths) => items
                .iter()
                .all(|v| v.is_compatible_with(ValueKind::Path)),
            _ => false,
        }
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float or Int value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON value; nested objects are rejected
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().ok_or_else(|| {
                    Error::invalid_argument(format!("number {} does not fit in f64", n))
                })?),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_json::Value::Object(_) => {
                return Err(Error::invalid_argument(
                    "nested objects are not valid argument values",
                ))
            }
        })
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DataPath> for Value {
    fn from(v: DataPath) -> Self {
        Value::Path(v)
    }
}

impl From<Vec<DataPath>> for Value {
    fn from(v: Vec<DataPath>) -> Self {
        Value::Paths(v)
    }
}

impl From<DataType> for Value {
    fn from(v: DataType) -> Self {
        Value::DataType(v)
    }
}

impl From<Vec<usize>> for Value {
    fn from(v: Vec<usize>) -> Self {
        Value::Shape(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(v.into_iter().map(Value::Float).collect())
    }
}

/// Flat name → value map supplied by the caller of a filter
///
/// Read-only to filters. Typed getters fail with
/// [`Error::InvalidArgument`] when the name is missing or the value has the
/// wrong kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    values: HashMap<String, Value>,
}

impl Arguments {
    /// Create an empty argument map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Raw lookup
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// True if a value is present under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all name/value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Build arguments from a JSON object
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(Error::invalid_argument("arguments must be a JSON object"));
        };
        let mut args = Arguments::new();
        for (name, v) in map {
            args.insert(name, Value::from_json(v)?);
        }
        Ok(args)
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| Error::invalid_argument(format!("missing argument '{}'", name)))
    }

    fn wrong_kind(name: &str, expected: ValueKind, value: &Value) -> Error {
        Error::invalid_argument(format!(
            "argument '{}' expected {}, found {}",
            name,
            expected,
            value.kind()
        ))
    }

    /// Read a Bool
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| Self::wrong_kind(name, ValueKind::Bool, value))
    }

    /// Read an Int
    pub fn get_int(&self, name: &str) -> Result<i64> {
        let value = self.require(name)?;
        value
            .as_int()
            .ok_or_else(|| Self::wrong_kind(name, ValueKind::Int, value))
    }

    /// Read an Int that must be non-negative
    pub fn get_usize(&self, name: &str) -> Result<usize> {
        let i = self.get_int(name)?;
        usize::try_from(i).map_err(|_| {
            Error::invalid_argument(format!("argument '{}' must be >= 0, found {}", name, i))
        })
    }

    /// Read a Float (an Int is accepted)
    pub fn get_float(&self, name: &str) -> Result<f64> {
        let value = self.require(name)?;
        value
            .as_float()
            .ok_or_else(|| Self::wrong_kind(name, ValueKind::Float, value))
    }

    /// Read a String
    pub fn get_string(&self, name: &str) -> Result<&str> {
        let value = self.require(name)?;
        value
            .as_str()
            .ok_or_else(|| Self::wrong_kind(name, ValueKind::String, value))
    }

    /// Read a Path (a String is parsed)
    pub fn get_path(&self, name: &str) -> Result<DataPath> {
        match self.require(name)? {
            Value::Path(p) => Ok(p.clone()),
            Value::String(s) => s.parse(),
            other => Err(Self::wrong_kind(name, ValueKind::Path, other)),
        }
    }

    /// Read a list of Paths (an Array of strings or paths is accepted)
    pub fn get_paths(&self, name: &str) -> Result<Vec<DataPath>> {
        match self.require(name)? {
            Value::Paths(p) => Ok(p.clone()),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Path(p) => Ok(p.clone()),
                    Value::String(s) => s.parse(),
                    other => Err(Self::wrong_kind(name, ValueKind::Path, other)),
                })
                .collect(),
            other => Err(Self::wrong_kind(name, ValueKind::Paths, other)),
        }
    }

    /// Read a DataType (a String is parsed)
    pub fn get_data_type(&self, name: &str) -> Result<DataType> {
        match self.require(name)? {
            Value::DataType(t) => Ok(*t),
            Value::String(s) => s.parse(),
            other => Err(Self::wrong_kind(name, ValueKind::DataType, other)),
        }
    }

    /// Read a Shape (an Array of non-negative Ints is accepted)
    pub fn get_shape(&self, name: &str) -> Result<Vec<usize>> {
        match self.require(name)? {
            Value::Shape(s) => Ok(s.clone()),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Int(i) if *i >= 0 => Ok(*i as usize),
                    other => Err(Self::wrong_kind(name, ValueKind::Shape, other)),
                })
                .collect(),
            other => Err(Self::wrong_kind(name, ValueKind::Shape, other)),
        }
    }

    /// Read a list of Floats from an Array of numbers
    pub fn get_float_vec(&self, name: &str) -> Result<Vec<f64>> {
        match self.require(name)? {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_float()
                        .ok_or_else(|| Self::wrong_kind(name, ValueKind::Float, item))
                })
                .collect(),
            other => Err(Self::wrong_kind(name, ValueKind::Array, other)),
        }
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Arguments {
            values: iter.into_iter().collect(),
        }
    }
}
