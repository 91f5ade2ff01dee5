//! Typed property values attached to the file, groups and channels.

use std::fmt;

use indexmap::IndexMap;

use super::{DataType, Timestamp};

/// Properties of one object, in the order they were first written.
pub type Properties = IndexMap<String, PropertyValue>;

/// A decoded property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// Signed 8-bit integer.
    I8(i8),
    /// Signed 16-bit integer.
    I16(i16),
    /// Signed 32-bit integer.
    I32(i32),
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 8-bit integer.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Single precision float.
    F32(f32),
    /// Double precision float.
    F64(f64),
    /// UTF-8 string.
    String(String),
    /// Boolean.
    Boolean(bool),
    /// Timestamp.
    Timestamp(Timestamp),
    /// Single precision complex number as `[re, im]`.
    ComplexF32([f32; 2]),
    /// Double precision complex number as `[re, im]`.
    ComplexF64([f64; 2]),
}

impl PropertyValue {
    /// Scalar type of the value.
    pub fn data_type(&self) -> DataType {
        match self {
            PropertyValue::I8(_) => DataType::I8,
            PropertyValue::I16(_) => DataType::I16,
            PropertyValue::I32(_) => DataType::I32,
            PropertyValue::I64(_) => DataType::I64,
            PropertyValue::U8(_) => DataType::U8,
            PropertyValue::U16(_) => DataType::U16,
            PropertyValue::U32(_) => DataType::U32,
            PropertyValue::U64(_) => DataType::U64,
            PropertyValue::F32(_) => DataType::F32,
            PropertyValue::F64(_) => DataType::F64,
            PropertyValue::String(_) => DataType::String,
            PropertyValue::Boolean(_) => DataType::Boolean,
            PropertyValue::Timestamp(_) => DataType::Timestamp,
            PropertyValue::ComplexF32(_) => DataType::ComplexF32,
            PropertyValue::ComplexF64(_) => DataType::ComplexF64,
        }
    }

    /// The value as `i64` if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PropertyValue::I8(v) => Some(i64::from(v)),
            PropertyValue::I16(v) => Some(i64::from(v)),
            PropertyValue::I32(v) => Some(i64::from(v)),
            PropertyValue::I64(v) => Some(v),
            PropertyValue::U8(v) => Some(i64::from(v)),
            PropertyValue::U16(v) => Some(i64::from(v)),
            PropertyValue::U32(v) => Some(i64::from(v)),
            PropertyValue::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// The value as `f64` if it is a real number.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PropertyValue::F32(v) => Some(f64::from(v)),
            PropertyValue::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// The value as a string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::I8(v) => write!(f, "{v}"),
            PropertyValue::I16(v) => write!(f, "{v}"),
            PropertyValue::I32(v) => write!(f, "{v}"),
            PropertyValue::I64(v) => write!(f, "{v}"),
            PropertyValue::U8(v) => write!(f, "{v}"),
            PropertyValue::U16(v) => write!(f, "{v}"),
            PropertyValue::U32(v) => write!(f, "{v}"),
            PropertyValue::U64(v) => write!(f, "{v}"),
            PropertyValue::F32(v) => write!(f, "{v}"),
            PropertyValue::F64(v) => write!(f, "{v}"),
            PropertyValue::String(v) => f.write_str(v),
            PropertyValue::Boolean(v) => write!(f, "{v}"),
            PropertyValue::Timestamp(v) => write!(f, "{v}"),
            PropertyValue::ComplexF32([re, im]) => write!(f, "{re}{im:+}j"),
            PropertyValue::ComplexF64([re, im]) => write!(f, "{re}{im:+}j"),
        }
    }
}
