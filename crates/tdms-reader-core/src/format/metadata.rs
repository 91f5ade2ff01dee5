//! Decoding of a segment's metadata block into object records.
//!
//! A metadata block is a `u32` object count followed, per object, by:
//!
//! 1. the object path (`u32` length + UTF-8),
//! 2. a raw data index: a `u32` header that is either a sentinel
//!    ([`NO_RAW_DATA`], [`MATCHES_PREVIOUS`], a DAQmx scaler marker) or the
//!    start of a new index (type code, dimension, value count, and for
//!    strings the total byte size),
//! 3. a `u32` property count and that many `(name, type code, value)` triples.
//!
//! All integers use the segment's byte order. Decoding is pure; interpreting
//! "matches previous" and merging records into the index happens in
//! [`crate::index`].

use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use snafu::prelude::*;

use super::{ByteOrderKind, DataType, ObjectPath, PropertyValue, Timestamp};
use crate::error::{CorruptMetadataSnafu, TdmsError, TdmsResult, UnknownDataTypeSnafu};

/// Raw data index header: the object has no data in this segment.
pub const NO_RAW_DATA: u32 = 0xFFFF_FFFF;
/// Raw data index header: reuse the object's previous index.
pub const MATCHES_PREVIOUS: u32 = 0x0000_0000;
/// Raw data index header: DAQmx format changing scaler.
pub const DAQMX_FORMAT_CHANGING_SCALER: u32 = 0x0000_1269;
/// Raw data index header: DAQmx digital line scaler.
pub const DAQMX_DIGITAL_LINE_SCALER: u32 = 0x0000_126A;

/// Type code reported for DAQmx raw data, which this reader does not decode.
pub const DAQMX_TYPE_CODE: u32 = 0xFFFF_FFFF;

/// Shape of one object's raw data within a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawDataIndex {
    /// Scalar type of every value.
    pub data_type: DataType,
    /// Values per chunk.
    pub number_of_values: u64,
    /// Bytes per chunk.
    pub data_size: u64,
}

/// What an object record says about its raw data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawDataIndexDecl {
    /// The object has no data in this segment.
    NoData,
    /// Same layout as the object's most recent index.
    MatchesPrevious,
    /// A new layout.
    New(RawDataIndex),
}

/// One object entry of a metadata block.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    /// Parsed object path.
    pub path: ObjectPath,
    /// Raw data declaration for this segment.
    pub raw_data_index: RawDataIndexDecl,
    /// Properties in file order.
    pub properties: Vec<(String, PropertyValue)>,
}

/// Decode every object record of a metadata block.
///
/// `segment_offset` is only used for error reporting.
pub fn parse_object_records(
    bytes: &[u8],
    order: ByteOrderKind,
    segment_offset: u64,
) -> TdmsResult<Vec<ObjectRecord>> {
    match order {
        ByteOrderKind::Little => {
            MetadataReader::<LittleEndian>::new(bytes, order, segment_offset).read_records()
        }
        ByteOrderKind::Big => {
            MetadataReader::<BigEndian>::new(bytes, order, segment_offset).read_records()
        }
    }
}

struct MetadataReader<'a, O> {
    bytes: &'a [u8],
    pos: usize,
    order: ByteOrderKind,
    segment_offset: u64,
    _order: PhantomData<O>,
}

impl<'a, O: ByteOrder> MetadataReader<'a, O> {
    fn new(bytes: &'a [u8], order: ByteOrderKind, segment_offset: u64) -> Self {
        Self {
            bytes,
            pos: 0,
            order,
            segment_offset,
            _order: PhantomData,
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> TdmsError {
        CorruptMetadataSnafu {
            offset: self.segment_offset,
            reason: reason.into(),
        }
        .build()
    }

    fn take(&mut self, n: usize) -> TdmsResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                self.corrupt(format!(
                    "metadata block of {} bytes ends while reading {n} bytes at position {}",
                    self.bytes.len(),
                    self.pos
                ))
            })?;
        let bytes: &'a [u8] = self.bytes;
        let slice = &bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> TdmsResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> TdmsResult<u32> {
        Ok(O::read_u32(self.take(4)?))
    }

    fn u64(&mut self) -> TdmsResult<u64> {
        Ok(O::read_u64(self.take(8)?))
    }

    fn string(&mut self) -> TdmsResult<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| self.corrupt(format!("string is not valid UTF-8: {e}")))
    }

    fn read_records(mut self) -> TdmsResult<Vec<ObjectRecord>> {
        let count = self.u32()? as usize;
        // Each record needs at least 12 bytes, which bounds the allocation for
        // corrupt counts.
        let mut records = Vec::with_capacity(count.min(self.bytes.len() / 12));
        for _ in 0..count {
            records.push(self.read_record()?);
        }
        Ok(records)
    }

    fn read_record(&mut self) -> TdmsResult<ObjectRecord> {
        let raw_path = self.string()?;
        let path = ObjectPath::parse(&raw_path)
            .ok_or_else(|| self.corrupt(format!("invalid object path {raw_path:?}")))?;
        let raw_data_index = self.read_raw_data_index(&raw_path)?;

        let property_count = self.u32()?;
        let mut properties = Vec::new();
        for _ in 0..property_count {
            let name = self.string()?;
            let code = self.u32()?;
            let value = self.read_property_value(code, &raw_path)?;
            properties.push((name, value));
        }

        Ok(ObjectRecord {
            path,
            raw_data_index,
            properties,
        })
    }

    fn read_raw_data_index(&mut self, path: &str) -> TdmsResult<RawDataIndexDecl> {
        match self.u32()? {
            NO_RAW_DATA => Ok(RawDataIndexDecl::NoData),
            MATCHES_PREVIOUS => Ok(RawDataIndexDecl::MatchesPrevious),
            DAQMX_FORMAT_CHANGING_SCALER | DAQMX_DIGITAL_LINE_SCALER => UnknownDataTypeSnafu {
                code: DAQMX_TYPE_CODE,
                path,
            }
            .fail(),
            _ => {
                let code = self.u32()?;
                let data_type =
                    DataType::from_code(code).context(UnknownDataTypeSnafu { code, path })?;
                let dimension = self.u32()?;
                if dimension != 1 {
                    return Err(self.corrupt(format!(
                        "object {path} declares array dimension {dimension}, expected 1"
                    )));
                }
                let number_of_values = self.u64()?;
                let data_size = match data_type.element_size() {
                    Some(size) => number_of_values.checked_mul(size).ok_or_else(|| {
                        self.corrupt(format!(
                            "object {path} declares {number_of_values} values, overflowing u64"
                        ))
                    })?,
                    None => {
                        let data_size = self.u64()?;
                        // every string needs at least its 4-byte end offset
                        let table_len = number_of_values.checked_mul(4);
                        if table_len.is_none_or(|len| len > data_size) {
                            return Err(self.corrupt(format!(
                                "object {path} declares {number_of_values} strings in {data_size} bytes"
                            )));
                        }
                        data_size
                    }
                };
                Ok(RawDataIndexDecl::New(RawDataIndex {
                    data_type,
                    number_of_values,
                    data_size,
                }))
            }
        }
    }

    fn read_property_value(&mut self, code: u32, path: &str) -> TdmsResult<PropertyValue> {
        let data_type = DataType::from_code(code).context(UnknownDataTypeSnafu { code, path })?;
        let value = match data_type {
            DataType::I8 => PropertyValue::I8(i8::from_le_bytes(self.array()?)),
            DataType::I16 => PropertyValue::I16(O::read_i16(self.take(2)?)),
            DataType::I32 => PropertyValue::I32(O::read_i32(self.take(4)?)),
            DataType::I64 => PropertyValue::I64(O::read_i64(self.take(8)?)),
            DataType::U8 => PropertyValue::U8(u8::from_le_bytes(self.array()?)),
            DataType::U16 => PropertyValue::U16(O::read_u16(self.take(2)?)),
            DataType::U32 => PropertyValue::U32(O::read_u32(self.take(4)?)),
            DataType::U64 => PropertyValue::U64(O::read_u64(self.take(8)?)),
            DataType::F32 => PropertyValue::F32(O::read_f32(self.take(4)?)),
            DataType::F64 => PropertyValue::F64(O::read_f64(self.take(8)?)),
            DataType::String => PropertyValue::String(self.string()?),
            DataType::Boolean => PropertyValue::Boolean(self.array::<1>()?[0] != 0),
            DataType::Timestamp => {
                let bytes = self.array::<16>()?;
                PropertyValue::Timestamp(match self.order {
                    ByteOrderKind::Little => Timestamp::from_le_bytes(bytes),
                    ByteOrderKind::Big => Timestamp::from_be_bytes(bytes),
                })
            }
            DataType::ComplexF32 => {
                let bytes = self.take(8)?;
                PropertyValue::ComplexF32([O::read_f32(&bytes[..4]), O::read_f32(&bytes[4..])])
            }
            DataType::ComplexF64 => {
                let bytes = self.take(16)?;
                PropertyValue::ComplexF64([O::read_f64(&bytes[..8]), O::read_f64(&bytes[8..])])
            }
        };
        Ok(value)
    }
}
