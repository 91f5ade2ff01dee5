//! On-disk building blocks of the TDMS format.
//!
//! Everything in this module is pure decoding over byte slices: lead-ins,
//! object paths, data type codes, property values and the per-object records
//! of a metadata block. No I/O happens here; [`crate::segment`] reads the bytes
//! and [`crate::index`] interprets the decoded records.

pub mod data_type;
pub mod lead_in;
pub mod metadata;
pub mod object_path;
pub mod property;
pub mod timestamp;

pub use data_type::DataType;
pub use lead_in::{ByteOrderKind, LEAD_IN_LEN, LeadIn, TocMask};
pub use metadata::{ObjectRecord, RawDataIndex, RawDataIndexDecl};
pub use object_path::ObjectPath;
pub use property::{Properties, PropertyValue};
pub use timestamp::Timestamp;
