//! Input sources for matrix readers
//!
//! A [`DataSource`] is either a local file or a byte buffer already in memory
//! (the usual case in the browser, where files arrive as `ArrayBuffer`s).
//! Gzip compression is detected from the magic bytes rather than the file
//! extension, since in-memory buffers have no name.

use crate::error::{Result, ScranError};
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Memory-mapped file threshold (50 MB)
///
/// Smaller files are read through a `BufReader`; at this size and above the
/// file is mapped instead.
pub const MMAP_THRESHOLD: u64 = 50 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Where matrix bytes come from
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Local file path
    Local(PathBuf),

    /// Bytes supplied by the caller
    Memory(Arc<[u8]>),
}

impl DataSource {
    /// Create a local file data source
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        DataSource::Local(path.as_ref().to_path_buf())
    }

    /// Create an in-memory data source
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        DataSource::Memory(bytes.into())
    }

    /// Path of a local source
    pub fn path(&self) -> Option<&Path> {
        match self {
            DataSource::Local(path) => Some(path),
            DataSource::Memory(_) => None,
        }
    }

    /// Open the source, decompressing gzip content transparently
    ///
    /// # Errors
    ///
    /// I/O errors for local files carry the file path.
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        match self {
            DataSource::Local(path) => {
                let raw = open_local_file(path).map_err(|e| e.in_file(path))?;
                decompress_if_needed(raw).map_err(|e| e.in_file(path))
            }
            DataSource::Memory(bytes) => decompress_if_needed(Box::new(Cursor::new(bytes.clone()))),
        }
    }

    /// Attach this source's path, if any, to an error
    pub(crate) fn annotate(&self, err: ScranError) -> ScranError {
        match self {
            DataSource::Local(path) => err.in_file(path),
            DataSource::Memory(_) => err,
        }
    }
}

/// Open a local file, mapping it into memory at or above [`MMAP_THRESHOLD`]
fn open_local_file(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let metadata = std::fs::metadata(path)?;
    let file = File::open(path)?;

    if metadata.len() >= MMAP_THRESHOLD {
        // SAFETY: the map is read-only and dropped with the reader; callers
        // must not truncate the file while it is being parsed.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Box::new(Cursor::new(mmap)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn decompress_if_needed(mut reader: Box<dyn BufRead + Send>) -> Result<Box<dyn BufRead + Send>> {
    let head = reader.fill_buf()?;
    if head.len() >= 2 && head[..2] == GZIP_MAGIC {
        log::debug!("Detected gzip-compressed input");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(reader)
    }
}
