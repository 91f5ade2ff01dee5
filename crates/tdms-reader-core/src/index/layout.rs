//! Computing where each channel's samples sit in a segment's raw data block.
//!
//! The raw data block is a sequence of identical chunks. Each chunk holds, for
//! every active object with data, that object's `data_size` bytes, in active
//! list order. In a contiguous segment each object's bytes are one run; in an
//! interleaved segment the chunk is a sequence of records holding one value
//! of every object.
//!
//! Either way a channel gets a single [`SegmentRange`] per segment; repeated
//! chunks are carried by its chunk count.

use log::warn;
use snafu::prelude::*;

use super::SegmentRange;
use crate::{
    error::{CorruptMetadataSnafu, TdmsResult},
    format::RawDataIndex,
    segment::SegmentDescriptor,
};

/// Runs for each object with data in `segment`, tagged with the object's
/// position in `indexes`.
pub(crate) fn segment_ranges(
    segment: &SegmentDescriptor,
    indexes: &[RawDataIndex],
) -> TdmsResult<Vec<(usize, SegmentRange)>> {
    if segment.is_interleaved() {
        interleaved_ranges(segment, indexes)
    } else {
        contiguous_ranges(segment, indexes)
    }
}

fn contiguous_ranges(
    segment: &SegmentDescriptor,
    indexes: &[RawDataIndex],
) -> TdmsResult<Vec<(usize, SegmentRange)>> {
    let chunk_size = indexes
        .iter()
        .try_fold(0u64, |size, index| size.checked_add(index.data_size))
        .context(CorruptMetadataSnafu {
            offset: segment.offset,
            reason: "chunk size of the raw data overflows u64",
        })?;
    if chunk_size == 0 {
        if segment.data_len > 0 {
            warn!(
                "segment {} has {} bytes of raw data but no object declares any",
                segment.ordinal, segment.data_len
            );
        }
        return Ok(Vec::new());
    }

    let chunks = segment.data_len / chunk_size;
    let leftover = segment.data_len % chunk_size;
    if leftover != 0 {
        warn!(
            "segment {} ends with a partial chunk of {leftover} bytes (chunk size {chunk_size}); ignoring it",
            segment.ordinal
        );
    }
    if chunks == 0 {
        return Ok(Vec::new());
    }

    let mut ranges = Vec::with_capacity(indexes.len());
    let mut offset = segment.data_offset;
    for (slot, index) in indexes.iter().enumerate() {
        if index.data_size > 0 && index.number_of_values > 0 {
            let stride = index.data_type.element_size().unwrap_or(0);
            let range = if stride > 0 && index.data_size == chunk_size {
                // the object owns the whole chunk, so its chunks are one packed run
                SegmentRange {
                    segment: segment.ordinal,
                    offset,
                    byte_len: chunk_size * chunks,
                    stride,
                    sample_count: index.number_of_values * chunks,
                    chunk_count: 1,
                    chunk_stride: chunk_size * chunks,
                    byte_order: segment.byte_order(),
                }
            } else {
                SegmentRange {
                    segment: segment.ordinal,
                    offset,
                    byte_len: index.data_size,
                    stride,
                    sample_count: index.number_of_values,
                    chunk_count: chunks,
                    chunk_stride: chunk_size,
                    byte_order: segment.byte_order(),
                }
            };
            ranges.push((slot, range));
        }
        offset += index.data_size;
    }
    Ok(ranges)
}

fn interleaved_ranges(
    segment: &SegmentDescriptor,
    indexes: &[RawDataIndex],
) -> TdmsResult<Vec<(usize, SegmentRange)>> {
    let mut widths = Vec::with_capacity(indexes.len());
    for index in indexes.iter().filter(|index| index.number_of_values > 0) {
        let width = index.data_type.element_size().context(CorruptMetadataSnafu {
            offset: segment.offset,
            reason: format!(
                "interleaved segment contains variable-width {} data",
                index.data_type
            ),
        })?;
        widths.push(width);
    }
    let record_width: u64 = widths.iter().sum();
    if record_width == 0 {
        return Ok(Vec::new());
    }

    let records = segment.data_len / record_width;
    let leftover = segment.data_len % record_width;
    if leftover != 0 {
        warn!(
            "interleaved segment {} ends with a partial record of {leftover} bytes (record width {record_width}); ignoring it",
            segment.ordinal
        );
    }
    if records == 0 {
        return Ok(Vec::new());
    }

    let mut ranges = Vec::with_capacity(widths.len());
    let mut field_offset = 0;
    for (slot, index) in indexes.iter().enumerate() {
        if index.number_of_values == 0 {
            continue;
        }
        let width = index.data_type.element_size().unwrap_or(0);
        ranges.push((
            slot,
            SegmentRange {
                segment: segment.ordinal,
                offset: segment.data_offset + field_offset,
                byte_len: (records - 1) * record_width + width,
                stride: record_width,
                sample_count: records,
                chunk_count: 1,
                chunk_stride: records * record_width,
                byte_order: segment.byte_order(),
            },
        ));
        field_offset += width;
    }
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::TdmsError,
        format::{DataType, LeadIn, TocMask},
    };

    fn segment(toc: u32, data_len: u64) -> SegmentDescriptor {
        SegmentDescriptor {
            ordinal: 3,
            offset: 0,
            lead_in: LeadIn {
                toc: TocMask::from_bits(toc | TocMask::RAW_DATA),
                version: 4713,
                next_segment_offset: data_len,
                raw_data_offset: 0,
            },
            metadata_offset: 28,
            metadata: None,
            data_offset: 28,
            data_len,
        }
    }

    fn index(data_type: DataType, n: u64) -> RawDataIndex {
        RawDataIndex {
            data_type,
            number_of_values: n,
            data_size: n * data_type.element_size().unwrap_or(1),
        }
    }

    #[test]
    fn contiguous_chunks_repeat() {
        let indexes = [index(DataType::I32, 2), index(DataType::F64, 1)];
        // chunk = 8 + 8 bytes, two chunks
        let ranges = segment_ranges(&segment(0, 32), &indexes).unwrap();
        assert_eq!(ranges.len(), 2);
        let (_, a) = ranges[0];
        let (_, b) = ranges[1];
        assert_eq!(a.chunk_offsets().collect::<Vec<_>>(), vec![28, 44]);
        assert_eq!(b.chunk_offsets().collect::<Vec<_>>(), vec![36, 52]);
        assert!(ranges.iter().all(|(_, r)| r.segment == 3));
        assert_eq!((a.stride, a.sample_count, a.total_samples()), (4, 2, 4));
        assert_eq!((b.sample_count, b.total_samples()), (1, 2));
    }

    #[test]
    fn many_small_chunks_stay_one_range_per_channel() {
        let indexes = [index(DataType::U8, 1), index(DataType::U8, 1)];
        let ranges = segment_ranges(&segment(0, 200_000), &indexes).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].1.chunk_count, 100_000);
        assert_eq!(ranges[1].1.total_samples(), 100_000);
    }

    #[test]
    fn sole_object_chunks_collapse_into_one_packed_run() {
        let indexes = [index(DataType::U8, 4)];
        let ranges = segment_ranges(&segment(0, 12), &indexes).unwrap();
        assert_eq!(ranges.len(), 1);
        let (_, run) = ranges[0];
        assert_eq!((run.chunk_count, run.byte_len, run.sample_count), (1, 12, 12));
        assert!(run.is_packed());
    }

    #[test]
    fn partial_trailing_chunk_is_dropped() {
        let indexes = [index(DataType::U8, 4)];
        let ranges = segment_ranges(&segment(0, 10), &indexes).unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].1.total_samples(), 8);
    }

    #[test]
    fn overflowing_chunk_size_is_corrupt() {
        let huge = RawDataIndex {
            data_type: DataType::U8,
            number_of_values: u64::MAX,
            data_size: u64::MAX,
        };
        let err = segment_ranges(&segment(0, 8), &[huge, index(DataType::U8, 1)]).unwrap_err();
        assert!(matches!(err, TdmsError::CorruptMetadata { .. }));
    }

    #[test]
    fn interleaved_ranges_use_record_stride() {
        let indexes = [index(DataType::I16, 3), index(DataType::I32, 3)];
        let ranges = segment_ranges(&segment(TocMask::INTERLEAVED, 18), &indexes).unwrap();
        assert_eq!(ranges.len(), 2);
        let (_, a) = ranges[0];
        let (_, b) = ranges[1];
        assert_eq!((a.offset, a.stride, a.sample_count, a.byte_len), (28, 6, 3, 14));
        assert_eq!((b.offset, b.stride, b.sample_count, b.byte_len), (30, 6, 3, 16));
    }

    #[test]
    fn interleaved_strings_are_rejected() {
        let indexes = [RawDataIndex {
            data_type: DataType::String,
            number_of_values: 2,
            data_size: 12,
        }];
        let err = segment_ranges(&segment(TocMask::INTERLEAVED, 12), &indexes).unwrap_err();
        assert!(
            matches!(err, TdmsError::CorruptMetadata { .. }),
            "unexpected error {err}"
        );
    }
}
