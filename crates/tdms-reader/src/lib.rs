//! # tdms-reader
//!
//! Read TDMS segmented measurement files and hand channel data to Arrow
//! consumers through the C Data Interface.
//!
//! This crate is the supported public entry point and provides a small, stable surface.
//!
//! ## Example
//!
//! ```no_run
//! use tdms_reader::prelude::*;
//!
//! # fn main() -> Result<(), TdmsError> {
//! let file = OpenOptions::new().recover_truncated(true).open("run.tdms")?;
//! let exported = file.channel_data("Measurements", "Voltage")?;
//! let (schema, array) = exported.into_raw_parts();
//! # drop((schema, array));
//! # Ok(())
//! # }
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// On-disk building blocks (lead-ins, object paths, property values).
pub mod format {
    pub use tdms_reader_core::format::{
        ByteOrderKind, DataType, LeadIn, ObjectPath, Properties, PropertyValue, Timestamp,
        TocMask,
    };
}

/// Byte sources a file can be opened over.
pub mod source {
    pub use tdms_reader_core::source::{ByteSource, FileSource, MemorySource, MmapSource};
}

pub use tdms_reader_core::{
    ChannelData, ChannelEntry, ChannelSample, ExportedArray, GroupEntry, MetadataIndex,
    OpenOptions, SegmentRange, SourceKind, TdmsError, TdmsFile, TdmsResult,
};
