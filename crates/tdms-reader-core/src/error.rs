//! Error types and SNAFU context selectors for the TDMS engine.
//!
//! Every fallible operation in this crate reports a [`TdmsError`]. Variants are
//! grouped by the stage that detects them: segment scanning (`CorruptHeader`,
//! `TruncatedFile`), metadata indexing (`UnknownDataType`,
//! `InconsistentChannelType`, `CorruptMetadata`), materialization (`Io`,
//! `CorruptData`) and export (`UnsupportedExportType`, `TimestampOutOfRange`,
//! `Arrow`). Lookups by name report `NoSuchGroup` / `NoSuchChannel`.
//!
//! Context selectors are `pub(crate)` so sibling modules can attach context
//! without the selectors leaking into the public API.

use std::io;

use arrow::error::ArrowError;
use snafu::{Backtrace, prelude::*};

use crate::format::DataType;

/// Convenience alias used throughout the crate.
pub type TdmsResult<T> = Result<T, TdmsError>;

/// Errors produced while opening, indexing, reading or exporting a TDMS file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TdmsError {
    /// The lead-in of a segment is not a valid TDMS lead-in.
    #[snafu(display("Corrupt segment header at byte {offset}: {reason}"))]
    CorruptHeader {
        /// Byte offset of the segment whose lead-in failed validation.
        offset: u64,
        /// Human-readable description of the check that failed.
        reason: String,
    },

    /// A segment declares more bytes than the source holds.
    ///
    /// This is the one error that [`OpenOptions::recover_truncated`] can turn
    /// into a warning.
    ///
    /// [`OpenOptions::recover_truncated`]: crate::OpenOptions::recover_truncated
    #[snafu(display(
        "Truncated file: segment at byte {offset} extends to byte {required} \
         but the source ends at byte {available}"
    ))]
    TruncatedFile {
        /// Byte offset of the incomplete segment.
        offset: u64,
        /// End position the segment declares.
        required: u64,
        /// Total length of the source.
        available: u64,
    },

    /// A data type code outside the supported set.
    #[snafu(display("Unsupported data type code {code:#x} for object {path}"))]
    UnknownDataType {
        /// Raw type code as stored in the file.
        code: u32,
        /// Object path the code was declared for.
        path: String,
    },

    /// A channel declared one scalar type and later segments another.
    #[snafu(display("Channel {path} changes data type from {existing} to {found}"))]
    InconsistentChannelType {
        /// Object path of the channel.
        path: String,
        /// Type established by earlier segments.
        existing: DataType,
        /// Conflicting type declared by the current segment.
        found: DataType,
    },

    /// The metadata block of a segment cannot be decoded.
    #[snafu(display("Corrupt metadata in segment at byte {offset}: {reason}"))]
    CorruptMetadata {
        /// Byte offset of the segment carrying the metadata.
        offset: u64,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Raw sample bytes cannot be decoded into the channel's type.
    #[snafu(display("Corrupt data for channel {path} at byte {offset}: {reason}"))]
    CorruptData {
        /// Object path of the channel being read.
        path: String,
        /// Byte offset of the range that failed to decode.
        offset: u64,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// Reading from the byte source failed.
    #[snafu(display("I/O error while {action}: {source}"))]
    Io {
        /// What the reader was doing when the error occurred.
        action: String,
        /// Underlying I/O error.
        source: io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// No group with the requested name exists.
    #[snafu(display("No group named '{group}'"))]
    NoSuchGroup {
        /// Requested group name.
        group: String,
    },

    /// The group exists but has no channel with the requested name.
    #[snafu(display("No channel named '{channel}' in group '{group}'"))]
    NoSuchChannel {
        /// Group that was searched.
        group: String,
        /// Requested channel name.
        channel: String,
    },

    /// The channel's scalar type has no Arrow counterpart.
    #[snafu(display("Channels of type {data_type} cannot be exported to Arrow"))]
    UnsupportedExportType {
        /// Scalar type of the channel.
        data_type: DataType,
    },

    /// A timestamp does not fit the Arrow nanosecond range.
    #[snafu(display(
        "Timestamp {seconds}s after 1904-01-01 does not fit in Unix nanoseconds"
    ))]
    TimestampOutOfRange {
        /// Whole seconds since the TDMS epoch.
        seconds: i64,
    },

    /// Building the Arrow array or its C Data Interface structs failed.
    #[snafu(display("Arrow export failed: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}

impl TdmsError {
    /// Returns `true` when the error only reports a missing group or channel.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TdmsError::NoSuchGroup { .. } | TdmsError::NoSuchChannel { .. }
        )
    }
}
