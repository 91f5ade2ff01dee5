//! Handing channel data to Arrow consumers through the C Data Interface.
//!
//! [`export`] turns a [`ChannelData`] into an [`ExportedArray`], which owns
//! one `ArrowSchema` and one `ArrowArray` struct. Fixed-width numeric buffers
//! are moved into Arrow, not copied: the `Vec` allocated by the materializer
//! becomes the Arrow values buffer, and the release callback installed by
//! `arrow::ffi` frees it.
//!
//! Ownership rules:
//!
//! - `ExportedArray` is move-only. [`ExportedArray::write_to`] and
//!   [`ExportedArray::into_raw_parts`] consume it; after either, the consumer
//!   is responsible for calling each struct's `release` exactly once.
//! - Dropping an `ExportedArray` that was never handed off releases both
//!   structs.
//! - Releasing sets the struct's `release` pointer to null, so a released
//!   struct is recognizable and its buffers are freed exactly once.

use std::{fmt, sync::Arc};

use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int8Array, Int16Array,
        Int32Array, Int64Array, NullArray, StringArray, TimestampNanosecondArray, UInt8Array,
        UInt16Array, UInt32Array, UInt64Array,
    },
    buffer::ScalarBuffer,
    datatypes::DataType as ArrowDataType,
    ffi::{FFI_ArrowArray, FFI_ArrowSchema, from_ffi, to_ffi},
};
use snafu::prelude::*;

use crate::{
    error::{ArrowSnafu, TdmsResult, TimestampOutOfRangeSnafu, UnsupportedExportTypeSnafu},
    format::{DataType, Timestamp},
    materialize::ChannelData,
};

/// Time zone attached to exported timestamp arrays.
pub const TIMESTAMP_TIME_ZONE: &str = "UTC";

/// Build an Arrow array over the channel's samples.
///
/// Numeric buffers are moved into the array without copying.
pub fn to_arrow_array(data: ChannelData) -> TdmsResult<ArrayRef> {
    let array: ArrayRef = match data {
        ChannelData::Void => Arc::new(NullArray::new(0)),
        ChannelData::I8(v) => Arc::new(Int8Array::new(ScalarBuffer::from(v), None)),
        ChannelData::I16(v) => Arc::new(Int16Array::new(ScalarBuffer::from(v), None)),
        ChannelData::I32(v) => Arc::new(Int32Array::new(ScalarBuffer::from(v), None)),
        ChannelData::I64(v) => Arc::new(Int64Array::new(ScalarBuffer::from(v), None)),
        ChannelData::U8(v) => Arc::new(UInt8Array::new(ScalarBuffer::from(v), None)),
        ChannelData::U16(v) => Arc::new(UInt16Array::new(ScalarBuffer::from(v), None)),
        ChannelData::U32(v) => Arc::new(UInt32Array::new(ScalarBuffer::from(v), None)),
        ChannelData::U64(v) => Arc::new(UInt64Array::new(ScalarBuffer::from(v), None)),
        ChannelData::F32(v) => Arc::new(Float32Array::new(ScalarBuffer::from(v), None)),
        ChannelData::F64(v) => Arc::new(Float64Array::new(ScalarBuffer::from(v), None)),
        ChannelData::Boolean(v) => Arc::new(BooleanArray::from(v)),
        ChannelData::String(v) => Arc::new(StringArray::from(v)),
        ChannelData::Timestamp(v) => {
            let nanos = timestamps_to_unix_nanos(&v)?;
            Arc::new(
                TimestampNanosecondArray::new(ScalarBuffer::from(nanos), None)
                    .with_timezone(TIMESTAMP_TIME_ZONE),
            )
        }
        ChannelData::ComplexF32(_) => {
            return UnsupportedExportTypeSnafu {
                data_type: DataType::ComplexF32,
            }
            .fail();
        }
        ChannelData::ComplexF64(_) => {
            return UnsupportedExportTypeSnafu {
                data_type: DataType::ComplexF64,
            }
            .fail();
        }
    };
    Ok(array)
}

/// Export the channel's samples as an Arrow C Data Interface pair.
pub fn export(data: ChannelData) -> TdmsResult<ExportedArray> {
    let array = to_arrow_array(data)?;
    ExportedArray::from_array(array.as_ref())
}

/// An `ArrowSchema` + `ArrowArray` pair awaiting handoff to a consumer.
pub struct ExportedArray {
    schema: FFI_ArrowSchema,
    array: FFI_ArrowArray,
    data_type: ArrowDataType,
    len: usize,
}

impl ExportedArray {
    /// Export an existing Arrow array. Buffers are shared, not copied.
    pub fn from_array(array: &dyn Array) -> TdmsResult<Self> {
        let data = array.to_data();
        let (array_ffi, schema_ffi) = to_ffi(&data).context(ArrowSnafu)?;
        Ok(Self {
            schema: schema_ffi,
            array: array_ffi,
            data_type: data.data_type().clone(),
            len: data.len(),
        })
    }

    /// Arrow type of the exported array.
    pub fn data_type(&self) -> &ArrowDataType {
        &self.data_type
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Null count reported to consumers. Exported channels never have nulls.
    pub fn null_count(&self) -> usize {
        0
    }

    /// Hand both structs to the caller. The caller must release each one
    /// exactly once, typically by dropping them or by passing them to a
    /// consumer that takes ownership.
    pub fn into_raw_parts(self) -> (FFI_ArrowSchema, FFI_ArrowArray) {
        (self.schema, self.array)
    }

    /// Move both structs into caller-provided memory.
    ///
    /// # Safety
    ///
    /// `schema_out` and `array_out` must be non-null, properly aligned and
    /// valid for writes of one `FFI_ArrowSchema` / `FFI_ArrowArray`. Whatever
    /// they pointed to before is overwritten without being released.
    pub unsafe fn write_to(self, schema_out: *mut FFI_ArrowSchema, array_out: *mut FFI_ArrowArray) {
        let (schema, array) = self.into_raw_parts();
        // SAFETY: upheld by the caller per the contract above.
        unsafe {
            std::ptr::write(schema_out, schema);
            std::ptr::write(array_out, array);
        }
    }

    /// Import the structs back as an Arrow array inside this process.
    ///
    /// Goes through the same C ABI an external consumer would use, so the
    /// resulting array shares the exported buffers.
    pub fn import(self) -> TdmsResult<ArrayRef> {
        let (schema, array) = self.into_raw_parts();
        // SAFETY: both structs were produced by `to_ffi` and have not been
        // released; `from_ffi` takes ownership of `array`.
        let data = unsafe { from_ffi(array, &schema) }.context(ArrowSnafu)?;
        Ok(arrow::array::make_array(data))
    }
}

impl fmt::Debug for ExportedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedArray")
            .field("data_type", &self.data_type)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

fn timestamps_to_unix_nanos(values: &[Timestamp]) -> TdmsResult<Vec<i64>> {
    values
        .iter()
        .map(|ts| {
            ts.to_unix_nanos().context(TimestampOutOfRangeSnafu {
                seconds: ts.seconds(),
            })
        })
        .collect()
}
