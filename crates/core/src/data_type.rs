//! Scalar kinds stored in data arrays
//!
//! [`DataType`] is the closed set of element kinds an array can hold and
//! [`Scalar`] ties each kind to its Rust type. Code that must pick a concrete
//! type from a kind read at run time does so once, at its entry point, with
//! [`dispatch_data_type!`](crate::dispatch_data_type), and runs statically
//! typed from there.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element kind of a data array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// `i8`
    Int8,
    /// `u8`
    UInt8,
    /// `i16`
    Int16,
    /// `u16`
    UInt16,
    /// `i32`
    Int32,
    /// `u32`
    UInt32,
    /// `i64`
    Int64,
    /// `u64`
    UInt64,
    /// `f32`
    Float32,
    /// `f64`
    Float64,
    /// `bool`
    Boolean,
}

impl DataType {
    /// Every kind, in declaration order
    pub const ALL: [DataType; 11] = [
        DataType::Int8,
        DataType::UInt8,
        DataType::Int16,
        DataType::UInt16,
        DataType::Int32,
        DataType::UInt32,
        DataType::Int64,
        DataType::UInt64,
        DataType::Float32,
        DataType::Float64,
        DataType::Boolean,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int8 => "int8",
            DataType::UInt8 => "uint8",
            DataType::Int16 => "int16",
            DataType::UInt16 => "uint16",
            DataType::Int32 => "int32",
            DataType::UInt32 => "uint32",
            DataType::Int64 => "int64",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Boolean => "boolean",
        }
    }

    /// Size of one element in bytes
    pub fn size_of(&self) -> usize {
        match self {
            DataType::Int8 | DataType::UInt8 | DataType::Boolean => 1,
            DataType::Int16 | DataType::UInt16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 => 8,
        }
    }

    /// True for the signed and unsigned integer kinds
    pub fn is_integer(&self) -> bool {
        !self.is_float() && !self.is_boolean()
    }

    /// True for `Float32` and `Float64`
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// True for `Boolean`
    pub fn is_boolean(&self) -> bool {
        matches!(self, DataType::Boolean)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "int8" | "i8" => DataType::Int8,
            "uint8" | "u8" => DataType::UInt8,
            "int16" | "i16" => DataType::Int16,
            "uint16" | "u16" => DataType::UInt16,
            "int32" | "i32" => DataType::Int32,
            "uint32" | "u32" => DataType::UInt32,
            "int64" | "i64" => DataType::Int64,
            "uint64" | "u64" => DataType::UInt64,
            "float32" | "f32" => DataType::Float32,
            "float64" | "f64" => DataType::Float64,
            "boolean" | "bool" => DataType::Boolean,
            other => {
                return Err(Error::invalid_argument(format!(
                    "unknown data type '{}'",
                    other
                )))
            }
        };
        Ok(kind)
    }
}

/// A Rust type that can be stored in a data array
///
/// Conversions through `f64` are saturating `as` casts; they exist for
/// kernels that aggregate values of any kind.
pub trait Scalar:
    Copy + Default + PartialEq + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Kind tag of this type
    const DATA_TYPE: DataType;

    /// Widen to `f64`
    fn to_f64(self) -> f64;

    /// Narrow from `f64`
    fn from_f64(value: f64) -> Self;

    /// Parse a textual value, rejecting anything out of range for the type
    fn parse_value(text: &str) -> Result<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const DATA_TYPE: DataType = DataType::$kind;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }

                fn parse_value(text: &str) -> Result<Self> {
                    text.trim().parse::<$ty>().map_err(|e| {
                        Error::invalid_argument(format!(
                            "'{}' is not a valid {}: {}",
                            text,
                            DataType::$kind,
                            e
                        ))
                    })
                }
            }
        )*
    };
}

impl_scalar!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
);

impl Scalar for bool {
    const DATA_TYPE: DataType = DataType::Boolean;

    #[inline]
    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value != 0.0
    }

    fn parse_value(text: &str) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(Error::invalid_argument(format!(
                "'{}' is not a valid boolean",
                other
            ))),
        }
    }
}

/// Run an expression with a type alias bound to the Rust type of a kind
///
/// ```
/// use tessera_core::{dispatch_data_type, DataType, Scalar};
///
/// fn element_size(kind: DataType) -> usize {
///     dispatch_data_type!(kind, T => std::mem::size_of::<T>())
/// }
///
/// assert_eq!(element_size(DataType::Float64), 8);
/// ```
#[macro_export]
macro_rules! dispatch_data_type {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            $crate::DataType::Int8 => {
                type $T = i8;
                $body
            }
            $crate::DataType::UInt8 => {
                type $T = u8;
                $body
            }
            $crate::DataType::Int16 => {
                type $T = i16;
                $body
            }
            $crate::DataType::UInt16 => {
                type $T = u16;
                $body
            }
            $crate::DataType::Int32 => {
                type $T = i32;
                $body
            }
            $crate::DataType::UInt32 => {
                type $T = u32;
                $body
            }
            $crate::DataType::Int64 => {
                type $T = i64;
                $body
            }
            $crate::DataType::UInt64 => {
                type $T = u64;
                $body
            }
            $crate::DataType::Float32 => {
                type $T = f32;
                $body
            }
            $crate::DataType::Float64 => {
                type $T = f64;
                $body
            }
            $crate::DataType::Boolean => {
                type $T = bool;
                $body
            }
        }
    };
}
