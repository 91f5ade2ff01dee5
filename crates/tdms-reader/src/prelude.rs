//! Wrapper prelude.
//!
//! Downstream code should prefer importing from this prelude instead of
//! depending on `tdms-reader-core` module paths.

pub use crate::format::{DataType, Properties, PropertyValue, Timestamp};
pub use crate::{
    ChannelData, ExportedArray, OpenOptions, SourceKind, TdmsError, TdmsFile, TdmsResult,
};
