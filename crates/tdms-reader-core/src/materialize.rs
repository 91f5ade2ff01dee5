//! Reading a channel's samples into one contiguous, typed buffer.
//!
//! [`materialize`] allocates fixed-width output up front from the index's
//! sample count and fills it range by range, chunk by chunk:
//!
//! - a packed range is read straight into the output buffer's bytes with one
//!   positioned read per chunk;
//! - an interleaved range is read as one span and the channel's field is
//!   copied out of every record;
//! - strings are decoded chunk by chunk, each chunk carrying its own offset
//!   table;
//! - samples from segments whose byte order differs from the host are swapped
//!   in place.
//!
//! Nothing is cached. On error the partially filled buffer is dropped.

use bytemuck::{Pod, Zeroable};
use snafu::prelude::*;

use crate::{
    error::{CorruptDataSnafu, IoSnafu, TdmsResult},
    format::{ByteOrderKind, DataType, Timestamp},
    index::ChannelEntry,
    source::ByteSource,
};

/// A channel's samples, one variant per scalar type.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelData {
    /// The channel never carried data.
    Void,
    /// Signed 8-bit integers.
    I8(Vec<i8>),
    /// Signed 16-bit integers.
    I16(Vec<i16>),
    /// Signed 32-bit integers.
    I32(Vec<i32>),
    /// Signed 64-bit integers.
    I64(Vec<i64>),
    /// Unsigned 8-bit integers.
    U8(Vec<u8>),
    /// Unsigned 16-bit integers.
    U16(Vec<u16>),
    /// Unsigned 32-bit integers.
    U32(Vec<u32>),
    /// Unsigned 64-bit integers.
    U64(Vec<u64>),
    /// Single precision floats.
    F32(Vec<f32>),
    /// Double precision floats.
    F64(Vec<f64>),
    /// Booleans.
    Boolean(Vec<bool>),
    /// UTF-8 strings.
    String(Vec<String>),
    /// Timestamps.
    Timestamp(Vec<Timestamp>),
    /// Single precision complex numbers as `[re, im]`.
    ComplexF32(Vec<[f32; 2]>),
    /// Double precision complex numbers as `[re, im]`.
    ComplexF64(Vec<[f64; 2]>),
}

impl ChannelData {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            ChannelData::Void => 0,
            ChannelData::I8(v) => v.len(),
            ChannelData::I16(v) => v.len(),
            ChannelData::I32(v) => v.len(),
            ChannelData::I64(v) => v.len(),
            ChannelData::U8(v) => v.len(),
            ChannelData::U16(v) => v.len(),
            ChannelData::U32(v) => v.len(),
            ChannelData::U64(v) => v.len(),
            ChannelData::F32(v) => v.len(),
            ChannelData::F64(v) => v.len(),
            ChannelData::Boolean(v) => v.len(),
            ChannelData::String(v) => v.len(),
            ChannelData::Timestamp(v) => v.len(),
            ChannelData::ComplexF32(v) => v.len(),
            ChannelData::ComplexF64(v) => v.len(),
        }
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar type of the samples, `None` for [`ChannelData::Void`].
    pub fn data_type(&self) -> Option<DataType> {
        let data_type = match self {
            ChannelData::Void => return None,
            ChannelData::I8(_) => DataType::I8,
            ChannelData::I16(_) => DataType::I16,
            ChannelData::I32(_) => DataType::I32,
            ChannelData::I64(_) => DataType::I64,
            ChannelData::U8(_) => DataType::U8,
            ChannelData::U16(_) => DataType::U16,
            ChannelData::U32(_) => DataType::U32,
            ChannelData::U64(_) => DataType::U64,
            ChannelData::F32(_) => DataType::F32,
            ChannelData::F64(_) => DataType::F64,
            ChannelData::Boolean(_) => DataType::Boolean,
            ChannelData::String(_) => DataType::String,
            ChannelData::Timestamp(_) => DataType::Timestamp,
            ChannelData::ComplexF32(_) => DataType::ComplexF32,
            ChannelData::ComplexF64(_) => DataType::ComplexF64,
        };
        Some(data_type)
    }

    /// Borrow the samples as a slice of `T`, if `T` is the channel's type.
    ///
    /// ```
    /// use tdms_reader_core::ChannelData;
    ///
    /// let data = ChannelData::F64(vec![1.0, 2.5]);
    /// assert_eq!(data.as_slice::<f64>(), Some(&[1.0, 2.5][..]));
    /// assert_eq!(data.as_slice::<i32>(), None);
    /// ```
    pub fn as_slice<T: ChannelSample>(&self) -> Option<&[T]> {
        T::slice_of(self)
    }

    /// Take the samples as a `Vec<T>`, if `T` is the channel's type.
    pub fn into_vec<T: ChannelSample>(self) -> Option<Vec<T>> {
        T::vec_of(self)
    }
}

/// Rust types a [`ChannelData`] variant can be viewed as.
pub trait ChannelSample: Sized {
    /// Borrow the matching variant.
    fn slice_of(data: &ChannelData) -> Option<&[Self]>;
    /// Take the matching variant.
    fn vec_of(data: ChannelData) -> Option<Vec<Self>>;
}

macro_rules! channel_sample {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ChannelSample for $ty {
                fn slice_of(data: &ChannelData) -> Option<&[Self]> {
                    match data {
                        ChannelData::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn vec_of(data: ChannelData) -> Option<Vec<Self>> {
                    match data {
                        ChannelData::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

channel_sample! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    bool => Boolean,
    String => String,
    Timestamp => Timestamp,
    [f32; 2] => ComplexF32,
    [f64; 2] => ComplexF64,
}

/// Fixed-width wire values that can be read as raw bytes.
trait WireValue: Pod {
    fn swap_bytes(self) -> Self;

    fn needs_swap(order: ByteOrderKind) -> bool {
        !order.is_native()
    }
}

macro_rules! wire_int {
    ($($ty:ty),*) => {
        $(impl WireValue for $ty {
            fn swap_bytes(self) -> Self {
                <$ty>::swap_bytes(self)
            }
        })*
    };
}

wire_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl WireValue for f32 {
    fn swap_bytes(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }
}

impl WireValue for f64 {
    fn swap_bytes(self) -> Self {
        f64::from_bits(self.to_bits().swap_bytes())
    }
}

impl<T: WireValue> WireValue for [T; 2]
where
    [T; 2]: Pod,
{
    fn swap_bytes(self) -> Self {
        [self[0].swap_bytes(), self[1].swap_bytes()]
    }
}

/// Timestamps in wire layout, normalized to the little-endian field order.
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
#[repr(transparent)]
struct RawTimestamp([u8; 16]);

impl WireValue for RawTimestamp {
    /// Reversing all 16 bytes turns big-endian (seconds, fractions) into
    /// little-endian (fractions, seconds).
    fn swap_bytes(self) -> Self {
        let mut out = self.0;
        out.reverse();
        RawTimestamp(out)
    }

    fn needs_swap(order: ByteOrderKind) -> bool {
        order == ByteOrderKind::Big
    }
}

/// Read every sample of `entry` from `source`.
pub fn materialize(entry: &ChannelEntry, source: &dyn ByteSource) -> TdmsResult<ChannelData> {
    let Some(data_type) = entry.data_type() else {
        return Ok(ChannelData::Void);
    };
    let data = match data_type {
        DataType::I8 => ChannelData::I8(read_fixed(entry, source)?),
        DataType::I16 => ChannelData::I16(read_fixed(entry, source)?),
        DataType::I32 => ChannelData::I32(read_fixed(entry, source)?),
        DataType::I64 => ChannelData::I64(read_fixed(entry, source)?),
        DataType::U8 => ChannelData::U8(read_fixed(entry, source)?),
        DataType::U16 => ChannelData::U16(read_fixed(entry, source)?),
        DataType::U32 => ChannelData::U32(read_fixed(entry, source)?),
        DataType::U64 => ChannelData::U64(read_fixed(entry, source)?),
        DataType::F32 => ChannelData::F32(read_fixed(entry, source)?),
        DataType::F64 => ChannelData::F64(read_fixed(entry, source)?),
        DataType::ComplexF32 => ChannelData::ComplexF32(read_fixed(entry, source)?),
        DataType::ComplexF64 => ChannelData::ComplexF64(read_fixed(entry, source)?),
        DataType::Boolean => {
            let bytes: Vec<u8> = read_fixed(entry, source)?;
            ChannelData::Boolean(bytes.into_iter().map(|b| b != 0).collect())
        }
        DataType::Timestamp => {
            let raw: Vec<RawTimestamp> = read_fixed(entry, source)?;
            ChannelData::Timestamp(
                raw.into_iter()
                    .map(|RawTimestamp(bytes)| Timestamp::from_le_bytes(bytes))
                    .collect(),
            )
        }
        DataType::String => ChannelData::String(read_strings(entry, source)?),
    };
    Ok(data)
}

fn sample_count(entry: &ChannelEntry) -> TdmsResult<usize> {
    usize::try_from(entry.sample_count()).ok().context(CorruptDataSnafu {
        path: entry.path(),
        offset: entry.ranges().first().map_or(0, |r| r.offset),
        reason: format!("{} samples do not fit in memory", entry.sample_count()),
    })
}

fn read_chunk(
    entry: &ChannelEntry,
    source: &dyn ByteSource,
    offset: u64,
    buf: &mut [u8],
) -> TdmsResult<()> {
    source.read_exact_at(offset, buf).context(IoSnafu {
        action: format!(
            "reading {} bytes of channel {} at byte {offset}",
            buf.len(),
            entry.path(),
        ),
    })
}

fn read_fixed<T: WireValue>(entry: &ChannelEntry, source: &dyn ByteSource) -> TdmsResult<Vec<T>> {
    let total = sample_count(entry)?;
    let width = size_of::<T>();
    let mut out = vec![T::zeroed(); total];
    let mut filled = 0usize;
    let mut span = Vec::new();

    for range in entry.ranges() {
        let count = range.sample_count as usize;
        for offset in range.chunk_offsets() {
            let dest = filled
                .checked_add(count)
                .and_then(|end| out.get_mut(filled..end))
                .context(CorruptDataSnafu {
                    path: entry.path(),
                    offset,
                    reason: "ranges hold more samples than the channel total",
                })?;

            if range.stride as usize == width {
                read_chunk(entry, source, offset, bytemuck::cast_slice_mut(dest))?;
            } else {
                span.resize(range.byte_len as usize, 0u8);
                read_chunk(entry, source, offset, &mut span)?;
                let stride = range.stride as usize;
                let dest_bytes: &mut [u8] = bytemuck::cast_slice_mut(dest);
                for (i, value) in dest_bytes.chunks_exact_mut(width).enumerate() {
                    let start = i * stride;
                    value.copy_from_slice(&span[start..start + width]);
                }
            }

            if T::needs_swap(range.byte_order) {
                for value in dest.iter_mut() {
                    *value = value.swap_bytes();
                }
            }
            filled += count;
        }
    }

    Ok(out)
}

/// The string count comes straight from the file, so the output grows chunk
/// by chunk once each chunk's offset table has been checked against its bytes.
fn read_strings(entry: &ChannelEntry, source: &dyn ByteSource) -> TdmsResult<Vec<String>> {
    let mut out = Vec::new();
    let mut block = Vec::new();

    for range in entry.ranges() {
        for offset in range.chunk_offsets() {
            block.resize(range.byte_len as usize, 0u8);
            read_chunk(entry, source, offset, &mut block)?;
            decode_strings(
                &block,
                range.sample_count,
                range.byte_order,
                offset,
                entry.path(),
                &mut out,
            )?;
        }
    }
    Ok(out)
}

/// Decode one string chunk: `n` cumulative end offsets, then the text.
fn decode_strings(
    block: &[u8],
    count: u64,
    byte_order: ByteOrderKind,
    offset: u64,
    path: &str,
    out: &mut Vec<String>,
) -> TdmsResult<()> {
    let corrupt = |reason: String| CorruptDataSnafu { path, offset, reason }.build();

    let table_len = usize::try_from(count)
        .ok()
        .and_then(|count| count.checked_mul(4))
        .filter(|&len| len <= block.len())
        .ok_or_else(|| corrupt(format!("offset table for {count} strings exceeds the chunk")))?;
    let (table, text) = block.split_at(table_len);
    out.reserve(table_len / 4);

    let mut start = 0usize;
    for raw_end in table.chunks_exact(4) {
        let raw_end: [u8; 4] = [raw_end[0], raw_end[1], raw_end[2], raw_end[3]];
        let end = match byte_order {
            ByteOrderKind::Little => u32::from_le_bytes(raw_end),
            ByteOrderKind::Big => u32::from_be_bytes(raw_end),
        } as usize;
        let bytes = text
            .get(start..end)
            .ok_or_else(|| corrupt(format!("string bytes {start}..{end} are outside the chunk")))?;
        let value = std::str::from_utf8(bytes)
            .map_err(|e| corrupt(format!("string is not valid UTF-8: {e}")))?;
        out.push(value.to_string());
        start = end;
    }
    Ok(())
}
