#![allow(dead_code)]

//! Test-only writer for byte-exact TDMS segments.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub const TOC_METADATA: u32 = 1 << 1;
pub const TOC_NEW_OBJ_LIST: u32 = 1 << 2;
pub const TOC_RAW_DATA: u32 = 1 << 3;
pub const TOC_INTERLEAVED: u32 = 1 << 5;
pub const TOC_BIG_ENDIAN: u32 = 1 << 6;

/// Metadata + new object list + raw data: the usual first segment.
pub const TOC_FULL: u32 = TOC_METADATA | TOC_NEW_OBJ_LIST | TOC_RAW_DATA;

pub const CODE_I32: u32 = 0x03;
pub const CODE_U8: u32 = 0x05;
pub const CODE_U16: u32 = 0x06;
pub const CODE_F32: u32 = 0x09;
pub const CODE_F64: u32 = 0x0A;
pub const CODE_STRING: u32 = 0x20;
pub const CODE_BOOL: u32 = 0x21;
pub const CODE_TIMESTAMP: u32 = 0x44;

#[derive(Clone, Debug)]
pub enum IndexSpec {
    NoData,
    MatchesPrevious,
    Values { code: u32, count: u64 },
    Strings { count: u64, total_size: u64 },
}

#[derive(Clone, Debug)]
pub enum PropSpec {
    I32(i32),
    F64(f64),
    String(String),
    Bool(bool),
    Timestamp { seconds: i64, fractions: u64 },
}

#[derive(Clone, Debug)]
struct ObjectSpec {
    path: String,
    index: IndexSpec,
    properties: Vec<(String, PropSpec)>,
}

#[derive(Clone, Debug)]
pub struct SegmentBuilder {
    toc: u32,
    objects: Vec<ObjectSpec>,
    data: Vec<u8>,
    unfinalized: bool,
}

impl SegmentBuilder {
    pub fn new(toc: u32) -> Self {
        Self {
            toc,
            objects: Vec::new(),
            data: Vec::new(),
            unfinalized: false,
        }
    }

    pub fn object(mut self, path: &str, index: IndexSpec) -> Self {
        self.objects.push(ObjectSpec {
            path: path.to_string(),
            index,
            properties: Vec::new(),
        });
        self
    }

    /// Attach a property to the most recently added object.
    pub fn property(mut self, name: &str, value: PropSpec) -> Self {
        if let Some(object) = self.objects.last_mut() {
            object.properties.push((name.to_string(), value));
        }
        self
    }

    pub fn data(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn unfinalized(mut self) -> Self {
        self.unfinalized = true;
        self
    }

    fn big_endian(&self) -> bool {
        self.toc & TOC_BIG_ENDIAN != 0
    }

    fn metadata(&self) -> Vec<u8> {
        let big = self.big_endian();
        let mut out = Vec::new();
        if self.toc & TOC_METADATA == 0 {
            return out;
        }
        put_u32(&mut out, self.objects.len() as u32, big);
        for object in &self.objects {
            put_string(&mut out, &object.path, big);
            match object.index {
                IndexSpec::NoData => put_u32(&mut out, 0xFFFF_FFFF, big),
                IndexSpec::MatchesPrevious => put_u32(&mut out, 0, big),
                IndexSpec::Values { code, count } => {
                    put_u32(&mut out, 20, big);
                    put_u32(&mut out, code, big);
                    put_u32(&mut out, 1, big);
                    put_u64(&mut out, count, big);
                }
                IndexSpec::Strings { count, total_size } => {
                    put_u32(&mut out, 28, big);
                    put_u32(&mut out, CODE_STRING, big);
                    put_u32(&mut out, 1, big);
                    put_u64(&mut out, count, big);
                    put_u64(&mut out, total_size, big);
                }
            }
            put_u32(&mut out, object.properties.len() as u32, big);
            for (name, value) in &object.properties {
                put_string(&mut out, name, big);
                match value {
                    PropSpec::I32(v) => {
                        put_u32(&mut out, CODE_I32, big);
                        put_u32(&mut out, *v as u32, big);
                    }
                    PropSpec::F64(v) => {
                        put_u32(&mut out, CODE_F64, big);
                        put_u64(&mut out, v.to_bits(), big);
                    }
                    PropSpec::String(v) => {
                        put_u32(&mut out, CODE_STRING, big);
                        put_string(&mut out, v, big);
                    }
                    PropSpec::Bool(v) => {
                        put_u32(&mut out, CODE_BOOL, big);
                        out.push(u8::from(*v));
                    }
                    PropSpec::Timestamp { seconds, fractions } => {
                        put_u32(&mut out, CODE_TIMESTAMP, big);
                        out.extend_from_slice(&timestamp_bytes(*seconds, *fractions, big));
                    }
                }
            }
        }
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let big = self.big_endian();
        let metadata = self.metadata();
        let next = if self.unfinalized {
            u64::MAX
        } else {
            (metadata.len() + self.data.len()) as u64
        };

        let mut out = b"TDSm".to_vec();
        out.extend_from_slice(&self.toc.to_le_bytes());
        put_u32(&mut out, 4713, big);
        put_u64(&mut out, next, big);
        put_u64(&mut out, metadata.len() as u64, big);
        out.extend_from_slice(&metadata);
        out.extend_from_slice(&self.data);
        out
    }
}

pub fn put_u32(out: &mut Vec<u8>, v: u32, big: bool) {
    if big {
        out.extend_from_slice(&v.to_be_bytes());
    } else {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

pub fn put_u64(out: &mut Vec<u8>, v: u64, big: bool) {
    if big {
        out.extend_from_slice(&v.to_be_bytes());
    } else {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn put_string(out: &mut Vec<u8>, s: &str, big: bool) {
    put_u32(out, s.len() as u32, big);
    out.extend_from_slice(s.as_bytes());
}

pub fn timestamp_bytes(seconds: i64, fractions: u64, big: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    if big {
        out.extend_from_slice(&seconds.to_be_bytes());
        out.extend_from_slice(&fractions.to_be_bytes());
    } else {
        out.extend_from_slice(&fractions.to_le_bytes());
        out.extend_from_slice(&seconds.to_le_bytes());
    }
    out
}

pub fn i32_le(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn f32_le(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn f64_le(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// String chunk: cumulative end offsets, then the concatenated text.
pub fn strings_le(values: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut end = 0u32;
    for value in values {
        end += value.len() as u32;
        out.extend_from_slice(&end.to_le_bytes());
    }
    for value in values {
        out.extend_from_slice(value.as_bytes());
    }
    out
}

pub fn concat(segments: &[Vec<u8>]) -> Vec<u8> {
    segments.concat()
}

pub fn write_file(dir: &TempDir, name: &str, segments: &[Vec<u8>]) -> TestResult<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, concat(segments))?;
    Ok(path)
}

pub fn file_len(path: &Path) -> TestResult<u64> {
    Ok(std::fs::metadata(path)?.len())
}
