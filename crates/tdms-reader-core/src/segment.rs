//! Walking the physical segments of a file.
//!
//! [`read_segment`] decodes one lead-in and, when the ToC says so, reads the
//! metadata block that follows it. It never touches raw sample bytes: the
//! descriptor only records where the raw data block starts and how long it is.
//! [`SegmentScan`] chains those reads from offset zero to the end of the
//! source.

use log::{debug, warn};
use snafu::prelude::*;

use crate::{
    error::{CorruptHeaderSnafu, IoSnafu, TdmsResult, TruncatedFileSnafu},
    format::{ByteOrderKind, LEAD_IN_LEN, LeadIn},
    source::ByteSource,
};

/// Everything the index builder needs to know about one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentDescriptor {
    /// Position of the segment in the file, starting at zero.
    pub ordinal: usize,
    /// Byte offset of the lead-in.
    pub offset: u64,
    /// Decoded lead-in.
    pub lead_in: LeadIn,
    /// Byte offset of the metadata block.
    pub metadata_offset: u64,
    /// Metadata block bytes, present when the ToC metadata flag is set.
    pub metadata: Option<Vec<u8>>,
    /// Byte offset of the raw data block.
    pub data_offset: u64,
    /// Length of the raw data block.
    pub data_len: u64,
}

impl SegmentDescriptor {
    /// The segment has no metadata and keeps the previous object list.
    pub fn reuses_previous_layout(&self) -> bool {
        !self.lead_in.toc.has_metadata()
    }

    /// The segment's metadata replaces the active object list.
    pub fn has_new_object_list(&self) -> bool {
        self.lead_in.toc.has_new_object_list()
    }

    /// Raw data is interleaved.
    pub fn is_interleaved(&self) -> bool {
        self.lead_in.toc.is_interleaved()
    }

    /// Byte order of metadata and raw data.
    pub fn byte_order(&self) -> ByteOrderKind {
        self.lead_in.byte_order()
    }

    /// Byte offset one past the end of the segment.
    pub fn end_offset(&self) -> u64 {
        self.data_offset + self.data_len
    }
}

/// Read the segment starting at `offset`.
///
/// Returns `Ok(None)` when `offset` is at (or past) the end of the source,
/// otherwise the descriptor and the offset of the following segment.
pub fn read_segment(
    source: &dyn ByteSource,
    offset: u64,
    ordinal: usize,
) -> TdmsResult<Option<(SegmentDescriptor, u64)>> {
    let available = source.len();
    if offset >= available {
        return Ok(None);
    }

    let metadata_offset = offset + LEAD_IN_LEN;
    ensure!(
        metadata_offset <= available,
        TruncatedFileSnafu {
            offset,
            required: metadata_offset,
            available,
        }
    );

    let mut lead_in_bytes = [0u8; LEAD_IN_LEN as usize];
    source
        .read_exact_at(offset, &mut lead_in_bytes)
        .context(IoSnafu {
            action: format!("reading segment lead-in at byte {offset}"),
        })?;
    let lead_in = LeadIn::parse(&lead_in_bytes, offset)?;

    let segment_len = if lead_in.is_unfinalized() {
        let remaining = available - metadata_offset;
        warn!(
            "segment at byte {offset} of {} was not finalized; treating the remaining {remaining} bytes as its contents",
            source.describe()
        );
        remaining
    } else {
        lead_in.next_segment_offset
    };

    let next_offset = metadata_offset
        .checked_add(segment_len)
        .context(CorruptHeaderSnafu {
            offset,
            reason: format!("next segment offset {segment_len} overflows the file position"),
        })?;
    let data_offset = metadata_offset
        .checked_add(lead_in.raw_data_offset)
        .context(CorruptHeaderSnafu {
            offset,
            reason: format!(
                "raw data offset {} overflows the file position",
                lead_in.raw_data_offset
            ),
        })?;
    ensure!(
        next_offset <= available && data_offset <= available,
        TruncatedFileSnafu {
            offset,
            required: next_offset.max(data_offset),
            available,
        }
    );

    let metadata = if lead_in.toc.has_metadata() {
        let mut bytes = vec![0u8; lead_in.raw_data_offset as usize];
        source
            .read_exact_at(metadata_offset, &mut bytes)
            .context(IoSnafu {
                action: format!("reading metadata of segment at byte {offset}"),
            })?;
        Some(bytes)
    } else {
        None
    };

    let data_len = if lead_in.toc.has_raw_data() {
        next_offset.saturating_sub(data_offset)
    } else {
        0
    };

    debug!(
        "segment {ordinal} at byte {offset}: toc={:#06x} metadata={}B raw={}B",
        lead_in.toc.bits(),
        lead_in.raw_data_offset,
        data_len
    );

    Ok(Some((
        SegmentDescriptor {
            ordinal,
            offset,
            lead_in,
            metadata_offset,
            metadata,
            data_offset,
            data_len,
        },
        next_offset,
    )))
}

/// Iterator over the segments of a source, in file order.
///
/// Stops after the first error.
pub struct SegmentScan<'a> {
    source: &'a dyn ByteSource,
    offset: u64,
    ordinal: usize,
    done: bool,
}

impl<'a> SegmentScan<'a> {
    /// Start scanning at the beginning of `source`.
    pub fn new(source: &'a dyn ByteSource) -> Self {
        Self {
            source,
            offset: 0,
            ordinal: 0,
            done: false,
        }
    }
}

impl Iterator for SegmentScan<'_> {
    type Item = TdmsResult<SegmentDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_segment(self.source, self.offset, self.ordinal) {
            Ok(Some((descriptor, next_offset))) => {
                self.offset = next_offset;
                self.ordinal += 1;
                Some(Ok(descriptor))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
