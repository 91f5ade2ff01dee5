//! Scalar data types a channel (or property) can carry.

use std::fmt;

/// Closed set of scalar types this reader decodes.
///
/// Codes with a unit suffix (`0x19`, `0x1A`) decode to the plain float types.
/// Void, extended precision, fixed point and DAQmx raw data are not part of
/// the set; [`DataType::from_code`] returns `None` for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// IEEE 754 single precision.
    F32,
    /// IEEE 754 double precision.
    F64,
    /// Variable-width UTF-8 string.
    String,
    /// One byte per value, non-zero is `true`.
    Boolean,
    /// 128-bit timestamp relative to 1904-01-01 UTC.
    Timestamp,
    /// Pair of single precision floats (real, imaginary).
    ComplexF32,
    /// Pair of double precision floats (real, imaginary).
    ComplexF64,
}

impl DataType {
    /// Decode a type code as stored in metadata and property records.
    pub fn from_code(code: u32) -> Option<DataType> {
        let data_type = match code {
            0x01 => DataType::I8,
            0x02 => DataType::I16,
            0x03 => DataType::I32,
            0x04 => DataType::I64,
            0x05 => DataType::U8,
            0x06 => DataType::U16,
            0x07 => DataType::U32,
            0x08 => DataType::U64,
            0x09 | 0x19 => DataType::F32,
            0x0A | 0x1A => DataType::F64,
            0x20 => DataType::String,
            0x21 => DataType::Boolean,
            0x44 => DataType::Timestamp,
            0x08_000C => DataType::ComplexF32,
            0x10_000D => DataType::ComplexF64,
            _ => return None,
        };
        Some(data_type)
    }

    /// Canonical code written for this type.
    pub fn code(self) -> u32 {
        match self {
            DataType::I8 => 0x01,
            DataType::I16 => 0x02,
            DataType::I32 => 0x03,
            DataType::I64 => 0x04,
            DataType::U8 => 0x05,
            DataType::U16 => 0x06,
            DataType::U32 => 0x07,
            DataType::U64 => 0x08,
            DataType::F32 => 0x09,
            DataType::F64 => 0x0A,
            DataType::String => 0x20,
            DataType::Boolean => 0x21,
            DataType::Timestamp => 0x44,
            DataType::ComplexF32 => 0x08_000C,
            DataType::ComplexF64 => 0x10_000D,
        }
    }

    /// Size in bytes of one value, or `None` for variable-width strings.
    pub fn element_size(self) -> Option<u64> {
        match self {
            DataType::I8 | DataType::U8 | DataType::Boolean => Some(1),
            DataType::I16 | DataType::U16 => Some(2),
            DataType::I32 | DataType::U32 | DataType::F32 => Some(4),
            DataType::I64 | DataType::U64 | DataType::F64 | DataType::ComplexF32 => Some(8),
            DataType::Timestamp | DataType::ComplexF64 => Some(16),
            DataType::String => None,
        }
    }

    /// Short lowercase name used in listings and error messages.
    pub fn name(self) -> &'static str {
        match self {
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::String => "string",
            DataType::Boolean => "bool",
            DataType::Timestamp => "timestamp",
            DataType::ComplexF32 => "complex64",
            DataType::ComplexF64 => "complex128",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_variants_collapse_to_plain_floats() {
        assert_eq!(DataType::from_code(0x19), Some(DataType::F32));
        assert_eq!(DataType::from_code(0x1A), Some(DataType::F64));
    }

    #[test]
    fn unsupported_codes_are_rejected() {
        for code in [0x00, 0x0B, 0x1B, 0x4F, 0x5000_0000, 0xFFFF_FFFF] {
            assert_eq!(DataType::from_code(code), None, "code {code:#x}");
        }
    }

    #[test]
    fn sizes_match_wire_widths() {
        assert_eq!(DataType::Timestamp.element_size(), Some(16));
        assert_eq!(DataType::ComplexF32.element_size(), Some(8));
        assert_eq!(DataType::String.element_size(), None);
        assert_eq!(DataType::from_code(DataType::U16.code()), Some(DataType::U16));
    }
}
