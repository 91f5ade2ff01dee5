//! The fixed 28-byte lead-in that opens every segment.
//!
//! Layout:
//!
//! | bytes  | field                 | byte order        |
//! |--------|-----------------------|-------------------|
//! | 0..4   | tag `TDSm`            | n/a               |
//! | 4..8   | table of contents     | always little     |
//! | 8..12  | version               | segment order     |
//! | 12..20 | next segment offset   | segment order     |
//! | 20..28 | raw data offset       | segment order     |
//!
//! Both offsets are relative to the end of the lead-in.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use snafu::prelude::*;

use crate::error::{CorruptHeaderSnafu, TdmsResult};

/// Length of a segment lead-in in bytes.
pub const LEAD_IN_LEN: u64 = 28;

/// Tag that starts every data segment.
pub const SEGMENT_TAG: [u8; 4] = *b"TDSm";

/// Format versions this reader accepts.
pub const SUPPORTED_VERSIONS: [i32; 2] = [4712, 4713];

/// Next segment offset written by a writer that never finalized its segment.
pub const UNFINALIZED_SEGMENT: u64 = u64::MAX;

/// Table-of-contents bit mask of a segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TocMask(u32);

impl TocMask {
    /// The segment carries a metadata block.
    pub const METADATA: u32 = 1 << 1;
    /// The metadata replaces the active object list instead of updating it.
    pub const NEW_OBJECT_LIST: u32 = 1 << 2;
    /// The segment carries raw data.
    pub const RAW_DATA: u32 = 1 << 3;
    /// Raw data is interleaved record by record.
    pub const INTERLEAVED: u32 = 1 << 5;
    /// Numeric fields after the ToC are big-endian.
    pub const BIG_ENDIAN: u32 = 1 << 6;
    /// Raw data is in DAQmx format.
    pub const DAQMX_RAW_DATA: u32 = 1 << 7;

    /// Wrap a raw ToC value.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw ToC value.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit in `flag` is set.
    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    /// Whether the segment carries a metadata block.
    pub fn has_metadata(self) -> bool {
        self.contains(Self::METADATA)
    }

    /// Whether the metadata starts a fresh object list.
    pub fn has_new_object_list(self) -> bool {
        self.contains(Self::NEW_OBJECT_LIST)
    }

    /// Whether the segment carries raw data.
    pub fn has_raw_data(self) -> bool {
        self.contains(Self::RAW_DATA)
    }

    /// Whether raw data is interleaved.
    pub fn is_interleaved(self) -> bool {
        self.contains(Self::INTERLEAVED)
    }

    /// Byte order of everything after the ToC.
    pub fn byte_order(self) -> ByteOrderKind {
        if self.contains(Self::BIG_ENDIAN) {
            ByteOrderKind::Big
        } else {
            ByteOrderKind::Little
        }
    }
}

/// Byte order of a segment's metadata and raw data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrderKind {
    /// Least significant byte first (the TDMS default).
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrderKind {
    /// Byte order of the running host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrderKind::Big
        } else {
            ByteOrderKind::Little
        }
    }

    /// Whether samples in this order can be used without swapping.
    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

/// Decoded lead-in of one segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeadIn {
    /// Table of contents.
    pub toc: TocMask,
    /// Format version (4712 or 4713).
    pub version: i32,
    /// Length of metadata plus raw data, or [`UNFINALIZED_SEGMENT`].
    pub next_segment_offset: u64,
    /// Length of the metadata block.
    pub raw_data_offset: u64,
}

impl LeadIn {
    /// Decode and validate a lead-in read from `segment_offset`.
    pub fn parse(bytes: &[u8; LEAD_IN_LEN as usize], segment_offset: u64) -> TdmsResult<Self> {
        ensure!(
            bytes[0..4] == SEGMENT_TAG,
            CorruptHeaderSnafu {
                offset: segment_offset,
                reason: format!("expected tag \"TDSm\", found {:02x?}", &bytes[0..4]),
            }
        );

        let toc = TocMask::from_bits(LittleEndian::read_u32(&bytes[4..8]));
        let lead_in = match toc.byte_order() {
            ByteOrderKind::Little => Self::decode_fields::<LittleEndian>(toc, bytes),
            ByteOrderKind::Big => Self::decode_fields::<BigEndian>(toc, bytes),
        };

        ensure!(
            SUPPORTED_VERSIONS.contains(&lead_in.version),
            CorruptHeaderSnafu {
                offset: segment_offset,
                reason: format!("unsupported version {}", lead_in.version),
            }
        );
        ensure!(
            lead_in.is_unfinalized() || lead_in.raw_data_offset <= lead_in.next_segment_offset,
            CorruptHeaderSnafu {
                offset: segment_offset,
                reason: format!(
                    "raw data offset {} exceeds next segment offset {}",
                    lead_in.raw_data_offset, lead_in.next_segment_offset
                ),
            }
        );

        Ok(lead_in)
    }

    fn decode_fields<O: ByteOrder>(toc: TocMask, bytes: &[u8; LEAD_IN_LEN as usize]) -> Self {
        Self {
            toc,
            version: O::read_i32(&bytes[8..12]),
            next_segment_offset: O::read_u64(&bytes[12..20]),
            raw_data_offset: O::read_u64(&bytes[20..28]),
        }
    }

    /// Whether the writer left the segment length unset.
    pub fn is_unfinalized(&self) -> bool {
        self.next_segment_offset == UNFINALIZED_SEGMENT
    }

    /// Byte order of the segment.
    pub fn byte_order(&self) -> ByteOrderKind {
        self.toc.byte_order()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TdmsError;

    fn lead_in_bytes(toc: u32, version: i32, next: u64, raw: u64, big: bool) -> [u8; 28] {
        let mut out = [0u8; 28];
        out[0..4].copy_from_slice(&SEGMENT_TAG);
        out[4..8].copy_from_slice(&toc.to_le_bytes());
        if big {
            out[8..12].copy_from_slice(&version.to_be_bytes());
            out[12..20].copy_from_slice(&next.to_be_bytes());
            out[20..28].copy_from_slice(&raw.to_be_bytes());
        } else {
            out[8..12].copy_from_slice(&version.to_le_bytes());
            out[12..20].copy_from_slice(&next.to_le_bytes());
            out[20..28].copy_from_slice(&raw.to_le_bytes());
        }
        out
    }

    #[test]
    fn parses_little_endian_lead_in() {
        let toc = TocMask::METADATA | TocMask::RAW_DATA | TocMask::NEW_OBJECT_LIST;
        let bytes = lead_in_bytes(toc, 4713, 120, 80, false);
        let lead_in = LeadIn::parse(&bytes, 0).unwrap();
        assert!(lead_in.toc.has_metadata());
        assert!(lead_in.toc.has_raw_data());
        assert!(!lead_in.toc.is_interleaved());
        assert_eq!(lead_in.byte_order(), ByteOrderKind::Little);
        assert_eq!(lead_in.next_segment_offset, 120);
        assert_eq!(lead_in.raw_data_offset, 80);
    }

    #[test]
    fn big_endian_flag_switches_field_order() {
        let toc = TocMask::METADATA | TocMask::BIG_ENDIAN;
        let bytes = lead_in_bytes(toc, 4712, 64, 64, true);
        let lead_in = LeadIn::parse(&bytes, 0).unwrap();
        assert_eq!(lead_in.byte_order(), ByteOrderKind::Big);
        assert_eq!(lead_in.version, 4712);
        assert_eq!(lead_in.next_segment_offset, 64);
    }

    #[test]
    fn rejects_bad_tag() {
        let mut bytes = lead_in_bytes(TocMask::METADATA, 4713, 10, 10, false);
        bytes[0] = b'X';
        let err = LeadIn::parse(&bytes, 42).unwrap_err();
        assert!(matches!(err, TdmsError::CorruptHeader { offset: 42, .. }));
    }

    #[test]
    fn rejects_unknown_version() {
        let bytes = lead_in_bytes(TocMask::METADATA, 1234, 10, 10, false);
        let err = LeadIn::parse(&bytes, 0).unwrap_err();
        assert!(matches!(err, TdmsError::CorruptHeader { .. }));
    }

    #[test]
    fn rejects_raw_offset_past_segment_end() {
        let bytes = lead_in_bytes(TocMask::METADATA, 4713, 10, 20, false);
        let err = LeadIn::parse(&bytes, 0).unwrap_err();
        assert!(matches!(err, TdmsError::CorruptHeader { .. }));
    }

    #[test]
    fn unfinalized_segment_is_accepted() {
        let bytes = lead_in_bytes(TocMask::RAW_DATA, 4713, UNFINALIZED_SEGMENT, 0, false);
        let lead_in = LeadIn::parse(&bytes, 0).unwrap();
        assert!(lead_in.is_unfinalized());
    }
}
