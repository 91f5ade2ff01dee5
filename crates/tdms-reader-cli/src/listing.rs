//! Serializable summary of a file's groups, channels and properties.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value, json};
use snafu::ResultExt;
use tdms_reader_core::{ChannelEntry, Properties, PropertyValue, TdmsFile};

use crate::error::{CliResult, ListGroupSnafu};

#[derive(Debug, Serialize)]
pub struct FileListing {
    pub path: String,
    pub segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_at: Option<u64>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    pub groups: Vec<GroupListing>,
}

#[derive(Debug, Serialize)]
pub struct GroupListing {
    pub name: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    pub channels: Vec<ChannelListing>,
}

#[derive(Debug, Serialize)]
pub struct ChannelListing {
    pub name: String,
    /// `None` for channels that never carried data.
    pub data_type: Option<String>,
    pub samples: u64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl FileListing {
    pub fn build(path: &str, file: &TdmsFile, with_properties: bool) -> CliResult<Self> {
        let props = |p: &Properties| {
            if with_properties {
                properties_json(p)
            } else {
                Map::new()
            }
        };

        let mut groups = Vec::new();
        for group in file.groups() {
            let entry = file
                .index()
                .group(group)
                .context(ListGroupSnafu { group })?;
            groups.push(GroupListing {
                name: group.to_string(),
                properties: props(entry.properties()),
                channels: entry
                    .channels()
                    .map(|channel| ChannelListing::new(channel, props(channel.properties())))
                    .collect(),
            });
        }

        Ok(Self {
            path: path.to_string(),
            segments: file.index().segment_count(),
            truncated_at: file.truncated_at(),
            properties: props(file.properties()),
            groups,
        })
    }
}

impl fmt::Display for FileListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} segments)", self.path, self.segments)?;
        if let Some(offset) = self.truncated_at {
            writeln!(f, "truncated at byte {offset}")?;
        }
        write_properties(f, "  ", &self.properties)?;
        for group in &self.groups {
            writeln!(f, "{}", group.name)?;
            write_properties(f, "    ", &group.properties)?;
            for channel in &group.channels {
                let data_type = channel.data_type.as_deref().unwrap_or("void");
                writeln!(
                    f,
                    "  {} / {}  {data_type}  {} samples",
                    group.name, channel.name, channel.samples
                )?;
                write_properties(f, "      ", &channel.properties)?;
            }
        }
        Ok(())
    }
}

impl ChannelListing {
    fn new(entry: &ChannelEntry, properties: Map<String, Value>) -> Self {
        Self {
            name: entry.name().to_string(),
            data_type: entry.data_type().map(|t| t.name().to_string()),
            samples: entry.sample_count(),
            properties,
        }
    }
}

fn write_properties(
    f: &mut fmt::Formatter<'_>,
    indent: &str,
    properties: &Map<String, Value>,
) -> fmt::Result {
    for (name, value) in properties {
        match value {
            Value::String(s) => writeln!(f, "{indent}{name} = {s}")?,
            other => writeln!(f, "{indent}{name} = {other}")?,
        }
    }
    Ok(())
}

pub fn properties_json(properties: &Properties) -> Map<String, Value> {
    properties
        .iter()
        .map(|(name, value)| (name.clone(), property_json(value)))
        .collect()
}

fn property_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::I8(v) => json!(v),
        PropertyValue::I16(v) => json!(v),
        PropertyValue::I32(v) => json!(v),
        PropertyValue::I64(v) => json!(v),
        PropertyValue::U8(v) => json!(v),
        PropertyValue::U16(v) => json!(v),
        PropertyValue::U32(v) => json!(v),
        PropertyValue::U64(v) => json!(v),
        PropertyValue::F32(v) => json!(f64::from(*v)),
        PropertyValue::F64(v) => json!(v),
        PropertyValue::String(v) => json!(v),
        PropertyValue::Boolean(v) => json!(v),
        PropertyValue::Timestamp(ts) => json!(ts.to_string()),
        PropertyValue::ComplexF32([re, im]) => json!([f64::from(*re), f64::from(*im)]),
        PropertyValue::ComplexF64([re, im]) => json!([re, im]),
    }
}
