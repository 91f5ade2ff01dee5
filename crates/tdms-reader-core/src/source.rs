//! Positioned byte sources backing an open file.
//!
//! The engine never streams: the segment scan and the materializer both ask
//! for "exactly these bytes at this offset". [`ByteSource`] captures that
//! contract, and every implementation is `Send + Sync` so channels can be
//! materialized from several threads against one open file.
//!
//! - [`FileSource`] issues positioned reads (`pread` on Unix, `seek_read` on
//!   Windows). Elsewhere a mutex serializes seek + read on a shared handle.
//! - [`MmapSource`] maps the file and copies out of the mapping.
//! - [`MemorySource`] serves a caller-provided buffer.

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use memmap2::Mmap;

/// Random-access, read-only byte storage.
pub trait ByteSource: Send + Sync {
    /// Total length in bytes.
    fn len(&self) -> u64;

    /// Whether the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the source ends before
    /// `buf` is full.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}

fn past_end(offset: u64, wanted: usize, len: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("read of {wanted} bytes at offset {offset} runs past end of source ({len} bytes)"),
    )
}

fn checked_range(offset: u64, wanted: usize, len: u64) -> io::Result<std::ops::Range<usize>> {
    let end = offset
        .checked_add(wanted as u64)
        .filter(|&end| end <= len)
        .ok_or_else(|| past_end(offset, wanted, len))?;
    Ok(offset as usize..end as usize)
}

/// A file read with positioned I/O.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    len: u64,
    #[cfg(any(unix, windows))]
    file: File,
    #[cfg(not(any(unix, windows)))]
    file: std::sync::Mutex<File>,
}

impl FileSource {
    /// Open `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            len,
            #[cfg(any(unix, windows))]
            file,
            #[cfg(not(any(unix, windows)))]
            file: std::sync::Mutex::new(file),
        })
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    #[cfg(unix)]
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .file
                .seek_read(&mut buf[filled..], offset + filled as u64)?;
            if n == 0 {
                return Err(past_end(offset, buf.len(), self.len));
            }
            filled += n;
        }
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        use std::io::{Read, Seek, SeekFrom};
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("file handle mutex poisoned"))?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A memory-mapped file.
#[derive(Debug)]
pub struct MmapSource {
    path: PathBuf,
    map: Mmap,
}

impl MmapSource {
    /// Map `path` read-only.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only. Concurrent truncation of the file
        // by another process is outside what this reader supports.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self {
            path: path.to_path_buf(),
            map,
        })
    }
}

impl ByteSource for MmapSource {
    fn len(&self) -> u64 {
        self.map.len() as u64
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let range = checked_range(offset, buf.len(), self.len())?;
        buf.copy_from_slice(&self.map[range]);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} (mmap)", self.path.display())
    }
}

/// An in-memory buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    bytes: Bytes,
}

impl MemorySource {
    /// Wrap a buffer. Accepts anything convertible to [`Bytes`], such as a
    /// `Vec<u8>` or a `&'static [u8]`.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let range = checked_range(offset, buf.len(), self.len())?;
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("<memory, {} bytes>", self.bytes.len())
    }
}
