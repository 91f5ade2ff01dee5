//! Opening files and looking up their contents.
//!
//! [`TdmsFile`] is the entry point: opening a file scans every segment once
//! and builds the [`MetadataIndex`]; sample bytes are only read when a channel
//! is requested. The index never changes after open, and the byte source is
//! shared read-only, so a `TdmsFile` can serve several threads at once.
//!
//! Open behavior is configured through [`OpenOptions`]:
//!
//! - strict (default): any truncated segment fails the open;
//! - recovering: a truncated trailing segment ends the scan and everything
//!   before it stays readable.

use std::path::Path;

use arrow::array::ArrayRef;
use bytes::Bytes;
use log::info;
use rayon::prelude::*;
use snafu::prelude::*;

use crate::{
    error::{IoSnafu, TdmsResult},
    export::{ExportedArray, export, to_arrow_array},
    format::Properties,
    index::{ChannelEntry, GroupEntry, MetadataIndex},
    materialize::{ChannelData, materialize},
    source::{ByteSource, FileSource, MemorySource, MmapSource},
};

/// How file bytes are accessed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceKind {
    /// Positioned reads against the open file handle.
    #[default]
    Buffered,
    /// Memory-map the file.
    Mmap,
    /// Read the whole file into memory at open.
    InMemory,
}

/// Options controlling how a file is opened.
#[derive(Clone, Debug, Default)]
pub struct OpenOptions {
    recover_truncated: bool,
    source: SourceKind,
}

impl OpenOptions {
    /// Strict options with positioned file reads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the readable prefix of a file whose last segment is truncated.
    pub fn recover_truncated(mut self, recover: bool) -> Self {
        self.recover_truncated = recover;
        self
    }

    /// Choose how bytes are read from disk.
    pub fn source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }

    /// Open the file at `path`.
    pub fn open(&self, path: impl AsRef<Path>) -> TdmsResult<TdmsFile> {
        let path = path.as_ref();
        let action = || format!("opening {}", path.display());
        let source: Box<dyn ByteSource> = match self.source {
            SourceKind::Buffered => Box::new(FileSource::open(path).context(IoSnafu {
                action: action(),
            })?),
            SourceKind::Mmap => Box::new(MmapSource::open(path).context(IoSnafu {
                action: action(),
            })?),
            SourceKind::InMemory => {
                let bytes = std::fs::read(path).context(IoSnafu { action: action() })?;
                Box::new(MemorySource::new(bytes))
            }
        };
        self.open_source(source)
    }

    /// Open a file held in memory.
    pub fn open_bytes(&self, bytes: impl Into<Bytes>) -> TdmsResult<TdmsFile> {
        self.open_source(Box::new(MemorySource::new(bytes)))
    }

    /// Open any byte source.
    pub fn open_source(&self, source: Box<dyn ByteSource>) -> TdmsResult<TdmsFile> {
        let scan = MetadataIndex::build(source.as_ref(), self.recover_truncated)?;
        if let Some(offset) = scan.truncated_at {
            info!(
                "{} opened in recovery mode; data from byte {offset} on is ignored",
                source.describe()
            );
        }
        Ok(TdmsFile {
            source,
            index: scan.index,
            truncated_at: scan.truncated_at,
        })
    }
}

/// An open TDMS file.
pub struct TdmsFile {
    source: Box<dyn ByteSource>,
    index: MetadataIndex,
    truncated_at: Option<u64>,
}

impl std::fmt::Debug for TdmsFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TdmsFile")
            .field("source", &self.source.describe())
            .field("segments", &self.index.segment_count())
            .field("truncated_at", &self.truncated_at)
            .finish()
    }
}

impl TdmsFile {
    /// Open `path` with default (strict) options.
    pub fn open(path: impl AsRef<Path>) -> TdmsResult<Self> {
        OpenOptions::new().open(path)
    }

    /// Open an in-memory file with default (strict) options.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> TdmsResult<Self> {
        OpenOptions::new().open_bytes(bytes)
    }

    /// The metadata index built at open.
    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    /// Whether a truncated trailing segment was dropped at open.
    pub fn is_truncated(&self) -> bool {
        self.truncated_at.is_some()
    }

    /// Byte offset of the dropped truncated segment, if any.
    pub fn truncated_at(&self) -> Option<u64> {
        self.truncated_at
    }

    /// File-level properties.
    pub fn properties(&self) -> &Properties {
        self.index.properties()
    }

    /// Group names in order of first appearance.
    pub fn groups(&self) -> Vec<&str> {
        self.index.groups().map(GroupEntry::name).collect()
    }

    /// Channel names of `group` in order of first appearance.
    pub fn group_channels(&self, group: &str) -> TdmsResult<Vec<&str>> {
        Ok(self
            .index
            .group(group)?
            .channels()
            .map(ChannelEntry::name)
            .collect())
    }

    /// Properties of `group`.
    pub fn group_properties(&self, group: &str) -> TdmsResult<&Properties> {
        Ok(self.index.group(group)?.properties())
    }

    /// Index entry of a channel.
    pub fn channel(&self, group: &str, channel: &str) -> TdmsResult<&ChannelEntry> {
        self.index.channel(group, channel)
    }

    /// Properties of a channel.
    pub fn channel_properties(&self, group: &str, channel: &str) -> TdmsResult<&Properties> {
        Ok(self.channel(group, channel)?.properties())
    }

    /// Read every sample of a channel.
    pub fn read_channel(&self, group: &str, channel: &str) -> TdmsResult<ChannelData> {
        materialize(self.channel(group, channel)?, self.source.as_ref())
    }

    /// Read several channels in parallel. Results follow the order of
    /// `channels`; the first failure is returned.
    pub fn read_channels(&self, channels: &[(&str, &str)]) -> TdmsResult<Vec<ChannelData>> {
        let entries = channels
            .iter()
            .map(|(group, channel)| self.channel(group, channel))
            .collect::<TdmsResult<Vec<_>>>()?;
        let source = self.source.as_ref();
        entries
            .into_par_iter()
            .map(|entry| materialize(entry, source))
            .collect()
    }

    /// Read a channel as an Arrow array.
    pub fn channel_array(&self, group: &str, channel: &str) -> TdmsResult<ArrayRef> {
        to_arrow_array(self.read_channel(group, channel)?)
    }

    /// Read a channel and export it through the Arrow C Data Interface.
    pub fn channel_data(&self, group: &str, channel: &str) -> TdmsResult<ExportedArray> {
        export(self.read_channel(group, channel)?)
    }
}
