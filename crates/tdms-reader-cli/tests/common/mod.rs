#![allow(dead_code)]

use std::path::Path;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn put_index(out: &mut Vec<u8>, code: u32, count: u64) {
    out.extend_from_slice(&20u32.to_le_bytes());
    out.extend_from_slice(&code.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
}

/// One little-endian segment: `/'Measurements'` with an f64 `Voltage`
/// channel and an i32 `Count` channel, plus a file and a channel property.
pub fn measurement_segment(voltage: &[f64], count: &[i32]) -> Vec<u8> {
    let mut meta = Vec::new();
    meta.extend_from_slice(&4u32.to_le_bytes());

    put_str(&mut meta, "/");
    meta.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    meta.extend_from_slice(&1u32.to_le_bytes());
    put_str(&mut meta, "title");
    meta.extend_from_slice(&0x20u32.to_le_bytes());
    put_str(&mut meta, "bench run");

    put_str(&mut meta, "/'Measurements'");
    meta.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    meta.extend_from_slice(&0u32.to_le_bytes());

    put_str(&mut meta, "/'Measurements'/'Voltage'");
    put_index(&mut meta, 0x0A, voltage.len() as u64);
    meta.extend_from_slice(&1u32.to_le_bytes());
    put_str(&mut meta, "unit");
    meta.extend_from_slice(&0x20u32.to_le_bytes());
    put_str(&mut meta, "V");

    put_str(&mut meta, "/'Measurements'/'Count'");
    put_index(&mut meta, 0x03, count.len() as u64);
    meta.extend_from_slice(&0u32.to_le_bytes());

    let mut data: Vec<u8> = voltage.iter().flat_map(|v| v.to_le_bytes()).collect();
    data.extend(count.iter().flat_map(|v| v.to_le_bytes()));

    let toc: u32 = (1 << 1) | (1 << 2) | (1 << 3);
    let mut out = b"TDSm".to_vec();
    out.extend_from_slice(&toc.to_le_bytes());
    out.extend_from_slice(&4713u32.to_le_bytes());
    out.extend_from_slice(&((meta.len() + data.len()) as u64).to_le_bytes());
    out.extend_from_slice(&(meta.len() as u64).to_le_bytes());
    out.extend(meta);
    out.extend(data);
    out
}

pub fn write_measurements(path: &Path, voltage: &[f64], count: &[i32]) -> TestResult {
    std::fs::write(path, measurement_segment(voltage, count))?;
    Ok(())
}
