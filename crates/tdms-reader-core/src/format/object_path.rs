//! Object paths: `/`, `/'group'` and `/'group'/'channel'`.
//!
//! Each component is wrapped in single quotes; a quote inside a name is
//! written twice. Names are compared byte for byte, with no normalization.

use std::fmt;

/// A parsed object path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectPath {
    /// The file object, `/`.
    Root,
    /// A group, `/'group'`.
    Group(String),
    /// A channel inside a group, `/'group'/'channel'`.
    Channel {
        /// Name of the owning group.
        group: String,
        /// Name of the channel.
        channel: String,
    },
}

impl ObjectPath {
    /// Parse a path string. Returns `None` for malformed paths and for paths
    /// nested deeper than a channel.
    pub fn parse(path: &str) -> Option<ObjectPath> {
        if path == "/" {
            return Some(ObjectPath::Root);
        }

        let mut components = Vec::with_capacity(2);
        let mut chars = path.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '/' || chars.next() != Some('\'') {
                return None;
            }
            let mut component = String::new();
            loop {
                match chars.next()? {
                    '\'' if chars.peek() == Some(&'\'') => {
                        chars.next();
                        component.push('\'');
                    }
                    '\'' => break,
                    other => component.push(other),
                }
            }
            components.push(component);
        }

        let mut components = components.into_iter();
        match (components.next(), components.next(), components.next()) {
            (Some(group), None, None) => Some(ObjectPath::Group(group)),
            (Some(group), Some(channel), None) => Some(ObjectPath::Channel { group, channel }),
            _ => None,
        }
    }

    /// Path of the group that owns this object, if any.
    pub fn group(&self) -> Option<&str> {
        match self {
            ObjectPath::Root => None,
            ObjectPath::Group(group) | ObjectPath::Channel { group, .. } => Some(group),
        }
    }

    /// Whether this path names a channel.
    pub fn is_channel(&self) -> bool {
        matches!(self, ObjectPath::Channel { .. })
    }

    /// Build the path string for a channel.
    pub fn channel_path(group: &str, channel: &str) -> String {
        ObjectPath::Channel {
            group: group.to_string(),
            channel: channel.to_string(),
        }
        .to_string()
    }
}

fn write_component(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    write!(f, "/'{}'", name.replace('\'', "''"))
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectPath::Root => f.write_str("/"),
            ObjectPath::Group(group) => write_component(f, group),
            ObjectPath::Channel { group, channel } => {
                write_component(f, group)?;
                write_component(f, channel)
            }
        }
    }
}
