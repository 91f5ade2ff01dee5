//! The metadata index: groups, channels, properties and sample locations.
//!
//! The index is built by folding segment descriptors into an explicit value,
//! one segment at a time and strictly in file order:
//!
//! ```text
//! index_0 = MetadataIndex::default()
//! index_n = index_{n-1}.apply(&segment_{n-1})?
//! ```
//!
//! [`MetadataIndex::apply`] consumes the previous index, so a segment that
//! fails to apply never leaves a half-updated index behind.
//!
//! Besides the public view (groups, channels, properties), the index carries
//! the layout state needed to interpret the next segment: the active object
//! list and each object's most recent raw data index. Segments without
//! metadata reuse that state unchanged.

mod entry;
mod layout;

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, warn};
use snafu::prelude::*;

pub use entry::{ChannelEntry, GroupEntry, SegmentRange};

use crate::{
    error::{
        CorruptMetadataSnafu, InconsistentChannelTypeSnafu, NoSuchChannelSnafu,
        NoSuchGroupSnafu, TdmsError, TdmsResult,
    },
    format::{
        ObjectPath, ObjectRecord, Properties, PropertyValue, RawDataIndex, RawDataIndexDecl,
        metadata::parse_object_records,
    },
    segment::{SegmentDescriptor, SegmentScan},
    source::ByteSource,
};

/// Object in the active list of the most recent segment.
#[derive(Clone, Debug, PartialEq)]
struct ActiveObject {
    path: ObjectPath,
    raw_data_index: Option<RawDataIndex>,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct LayoutState {
    active: Vec<ActiveObject>,
    last_index: HashMap<ObjectPath, RawDataIndex>,
}

/// Immutable-after-build index of a file's objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataIndex {
    properties: Properties,
    groups: IndexMap<String, GroupEntry>,
    layout: LayoutState,
    segment_count: usize,
}

/// Result of scanning a whole source into an index.
#[derive(Debug)]
pub struct IndexScan {
    /// The index over every fully readable segment.
    pub index: MetadataIndex,
    /// Offset of the truncated segment that ended the scan, if recovery kicked
    /// in.
    pub truncated_at: Option<u64>,
}

impl MetadataIndex {
    /// Scan every segment of `source` and fold it into an index.
    ///
    /// With `recover_truncated`, a [`TdmsError::TruncatedFile`] stops the scan
    /// and keeps everything indexed so far. Any other error is returned.
    pub fn build(source: &dyn ByteSource, recover_truncated: bool) -> TdmsResult<IndexScan> {
        let mut index = MetadataIndex::default();
        let mut truncated_at = None;

        for segment in SegmentScan::new(source) {
            match segment {
                Ok(segment) => index = index.apply(&segment)?,
                Err(TdmsError::TruncatedFile {
                    offset,
                    required,
                    available,
                }) if recover_truncated => {
                    warn!(
                        "{}: segment at byte {offset} needs {required} bytes but only {available} exist; \
                         keeping the {} complete segments before it",
                        source.describe(),
                        index.segment_count
                    );
                    truncated_at = Some(offset);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            "{}: indexed {} segments, {} groups",
            source.describe(),
            index.segment_count,
            index.groups.len()
        );
        Ok(IndexScan {
            index,
            truncated_at,
        })
    }

    /// Fold one segment into the index.
    pub fn apply(mut self, segment: &SegmentDescriptor) -> TdmsResult<Self> {
        if let Some(metadata) = &segment.metadata {
            let records = parse_object_records(metadata, segment.byte_order(), segment.offset)?;
            self.merge_records(segment, records)?;
        }
        if segment.data_len > 0 {
            self.append_ranges(segment)?;
        }
        self.segment_count += 1;
        Ok(self)
    }

    fn merge_records(
        &mut self,
        segment: &SegmentDescriptor,
        records: Vec<ObjectRecord>,
    ) -> TdmsResult<()> {
        let mut active = if segment.has_new_object_list() {
            Vec::with_capacity(records.len())
        } else {
            std::mem::take(&mut self.layout.active)
        };
        let mut positions: HashMap<ObjectPath, usize> = active
            .iter()
            .enumerate()
            .map(|(i, object)| (object.path.clone(), i))
            .collect();

        for record in records {
            let raw_data_index = match record.raw_data_index {
                RawDataIndexDecl::NoData => None,
                RawDataIndexDecl::MatchesPrevious => Some(
                    *self
                        .layout
                        .last_index
                        .get(&record.path)
                        .context(CorruptMetadataSnafu {
                            offset: segment.offset,
                            reason: format!(
                                "object {} reuses a raw data index it never declared",
                                record.path
                            ),
                        })?,
                ),
                RawDataIndexDecl::New(index) => Some(index),
            };

            if let Some(index) = raw_data_index {
                self.declare_layout(&record.path, index, segment)?;
            }
            self.merge_properties(&record.path, record.properties);

            match positions.get(&record.path) {
                Some(&i) => active[i].raw_data_index = raw_data_index,
                None => {
                    positions.insert(record.path.clone(), active.len());
                    active.push(ActiveObject {
                        path: record.path,
                        raw_data_index,
                    });
                }
            }
        }

        self.layout.active = active;
        Ok(())
    }

    fn declare_layout(
        &mut self,
        path: &ObjectPath,
        index: RawDataIndex,
        segment: &SegmentDescriptor,
    ) -> TdmsResult<()> {
        let ObjectPath::Channel { group, channel } = path else {
            return CorruptMetadataSnafu {
                offset: segment.offset,
                reason: format!("object {path} is not a channel but declares raw data"),
            }
            .fail();
        };

        let entry = self.channel_entry_mut(group, channel);
        if let Some(existing) = entry.data_type
            && existing != index.data_type
        {
            return InconsistentChannelTypeSnafu {
                path: entry.path.clone(),
                existing,
                found: index.data_type,
            }
            .fail();
        }
        entry.data_type = Some(index.data_type);
        self.layout.last_index.insert(path.clone(), index);
        Ok(())
    }

    fn merge_properties(&mut self, path: &ObjectPath, properties: Vec<(String, PropertyValue)>) {
        let target = match path {
            ObjectPath::Root => &mut self.properties,
            ObjectPath::Group(group) => &mut self.group_entry_mut(group).properties,
            ObjectPath::Channel { group, channel } => {
                &mut self.channel_entry_mut(group, channel).properties
            }
        };
        target.extend(properties);
    }

    fn group_entry_mut(&mut self, group: &str) -> &mut GroupEntry {
        self.groups
            .entry(group.to_string())
            .or_insert_with(|| GroupEntry::new(group))
    }

    fn channel_entry_mut(&mut self, group: &str, channel: &str) -> &mut ChannelEntry {
        self.group_entry_mut(group)
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| ChannelEntry::new(group, channel))
    }

    fn append_ranges(&mut self, segment: &SegmentDescriptor) -> TdmsResult<()> {
        let (paths, indexes): (Vec<&ObjectPath>, Vec<RawDataIndex>) = self
            .layout
            .active
            .iter()
            .filter_map(|object| Some((&object.path, object.raw_data_index?)))
            .unzip();

        for (slot, range) in layout::segment_ranges(segment, &indexes)? {
            if let ObjectPath::Channel { group, channel } = paths[slot]
                && let Some(entry) = self
                    .groups
                    .get_mut(group)
                    .and_then(|g| g.channels.get_mut(channel))
            {
                entry.push_range(range);
            }
        }
        Ok(())
    }

    /// File-level properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Groups in order of first appearance.
    pub fn groups(&self) -> impl Iterator<Item = &GroupEntry> {
        self.groups.values()
    }

    /// Look up a group by exact name.
    pub fn group(&self, name: &str) -> TdmsResult<&GroupEntry> {
        self.groups
            .get(name)
            .context(NoSuchGroupSnafu { group: name })
    }

    /// Look up a channel by exact group and channel name.
    pub fn channel(&self, group: &str, channel: &str) -> TdmsResult<&ChannelEntry> {
        self.group(group)?
            .channel(channel)
            .context(NoSuchChannelSnafu { group, channel })
    }

    /// Number of segments folded into the index.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }
}
