//! Index entries for groups and channels.

use indexmap::IndexMap;

use crate::format::{ByteOrderKind, DataType, Properties};

/// Where one run of a channel's samples lives in the file.
///
/// A run describes the channel's slice of one chunk and how often that slice
/// repeats: chunk `k` starts at `offset + k * chunk_stride`. Repeated chunks of
/// a segment therefore cost one entry, not one per chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentRange {
    /// Ordinal of the segment holding the run.
    pub segment: usize,
    /// Byte offset of the first sample of the first chunk.
    pub offset: u64,
    /// Bytes to read starting at a chunk's offset to cover that chunk's
    /// samples.
    pub byte_len: u64,
    /// Distance in bytes between consecutive samples. Equals the element size
    /// for contiguous runs, the record width for interleaved runs, and zero
    /// for variable-width strings.
    pub stride: u64,
    /// Number of samples per chunk.
    pub sample_count: u64,
    /// Number of chunks the run repeats over.
    pub chunk_count: u64,
    /// Distance in bytes between the starts of consecutive chunks.
    pub chunk_stride: u64,
    /// Byte order of the segment.
    pub byte_order: ByteOrderKind,
}

impl SegmentRange {
    /// Whether the samples of a chunk are densely packed (no interleaving).
    pub fn is_packed(&self) -> bool {
        self.stride != 0 && self.byte_len == self.sample_count * self.stride
    }

    /// Samples across every chunk of the run.
    pub fn total_samples(&self) -> u64 {
        self.sample_count.saturating_mul(self.chunk_count)
    }

    /// Byte offset of each chunk, in file order.
    pub fn chunk_offsets(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.chunk_count).map(move |chunk| self.offset + chunk * self.chunk_stride)
    }

    /// Extend this run with `next` if it continues it byte for byte.
    pub(crate) fn try_extend(&mut self, next: &SegmentRange) -> bool {
        let adjacent = self.segment == next.segment
            && self.stride == next.stride
            && self.byte_order == next.byte_order
            && self.chunk_count == 1
            && next.chunk_count == 1
            && self.offset + self.byte_len == next.offset;
        if adjacent && self.is_packed() && next.is_packed() {
            self.byte_len += next.byte_len;
            self.sample_count += next.sample_count;
            self.chunk_stride = self.byte_len;
            true
        } else {
            false
        }
    }
}

/// Everything the index knows about one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelEntry {
    pub(crate) group: String,
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) data_type: Option<DataType>,
    pub(crate) ranges: Vec<SegmentRange>,
    pub(crate) sample_count: u64,
    pub(crate) properties: Properties,
}

impl ChannelEntry {
    pub(crate) fn new(group: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
            path: crate::format::ObjectPath::channel_path(group, name),
            data_type: None,
            ranges: Vec::new(),
            sample_count: 0,
            properties: Properties::new(),
        }
    }

    pub(crate) fn push_range(&mut self, range: SegmentRange) {
        self.sample_count += range.total_samples();
        if let Some(last) = self.ranges.last_mut()
            && last.try_extend(&range)
        {
            return;
        }
        self.ranges.push(range);
    }

    /// Name of the owning group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full object path, `/'group'/'channel'`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Scalar type, or `None` if no segment ever declared data for it.
    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    /// Runs of samples in file order.
    pub fn ranges(&self) -> &[SegmentRange] {
        &self.ranges
    }

    /// Total number of samples across all runs.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Channel properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// A group and its channels.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupEntry {
    pub(crate) name: String,
    pub(crate) properties: Properties,
    pub(crate) channels: IndexMap<String, ChannelEntry>,
}

impl GroupEntry {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: Properties::new(),
            channels: IndexMap::new(),
        }
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Channels in order of first appearance.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelEntry> {
        self.channels.values()
    }

    /// Look up a channel by exact name.
    pub fn channel(&self, name: &str) -> Option<&ChannelEntry> {
        self.channels.get(name)
    }
}
