//! Decoding engine for TDMS segmented measurement files.
//!
//! This crate provides the pieces behind `tdms-reader`:
//!
//! - Pure decoders for the on-disk building blocks: lead-ins, object paths,
//!   data type codes, property values and metadata records (`format` module).
//! - A segment reader that walks a file's segments without touching sample
//!   bytes (`segment` module).
//! - A metadata index built as a fold over segment descriptors, mapping
//!   groups to channels and channels to their data type, sample locations and
//!   properties (`index` module).
//! - A materializer that reads one channel's samples into a contiguous typed
//!   buffer, handling contiguous, interleaved and big-endian segments
//!   (`materialize` module).
//! - An exporter that hands buffers to Arrow consumers through the C Data
//!   Interface without copying numeric samples (`export` module).
//!
//! ```no_run
//! use tdms_reader_core::{ChannelData, TdmsFile};
//!
//! # fn main() -> Result<(), tdms_reader_core::TdmsError> {
//! let file = TdmsFile::open("measurement.tdms")?;
//! for group in file.groups() {
//!     for channel in file.group_channels(group)? {
//!         let data: ChannelData = file.read_channel(group, channel)?;
//!         println!("{group}/{channel}: {} samples", data.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod error;
pub mod export;
pub mod file;
pub mod format;
pub mod index;
pub mod materialize;
pub mod segment;
pub mod source;

pub use error::{TdmsError, TdmsResult};
pub use export::{ExportedArray, export, to_arrow_array};
pub use file::{OpenOptions, SourceKind, TdmsFile};
pub use format::{DataType, Properties, PropertyValue, Timestamp};
pub use index::{ChannelEntry, GroupEntry, MetadataIndex, SegmentRange};
pub use materialize::{ChannelData, ChannelSample, materialize};
pub use source::ByteSource;
