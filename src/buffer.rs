//! The immutable byte buffer under inspection.
//!
//! A [`Buffer`] is loaded once and never mutated. Cloning it is cheap and
//! aliases the same memory, so regions, strings and structure references
//! only ever carry offsets into it.

use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::ops::{Deref, Range};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::IoConfig;
use crate::error::{MzError, Result};

/// Immutable, reference-counted view of the inspected file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    bytes: Bytes,
}

impl Buffer {
    /// Take ownership of an in-memory image.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(data),
        }
    }

    /// Wrap static data without copying.
    pub fn from_static(data: &'static [u8]) -> Self {
        Self {
            bytes: Bytes::from_static(data),
        }
    }

    /// Memory-map a file and copy it into a shared buffer.
    ///
    /// Fails with [`MzError::FileTooLarge`] when the file exceeds
    /// `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IoConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limit = limits.max_file_size,
            "Opening file"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(MzError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        // memmap cannot map empty files.
        if file_size == 0 {
            return Ok(Self::default());
        }

        // Safety: read-only map of a regular file, copied out before the map is dropped.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self {
            bytes: Bytes::copy_from_slice(&map[..]),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes in `range`, or `None` when it leaves the buffer.
    pub fn get(&self, range: Range<usize>) -> Option<&[u8]> {
        self.bytes.get(range)
    }

    /// Shared sub-buffer aliasing the same memory.
    pub fn slice(&self, range: Range<usize>) -> Option<Buffer> {
        if range.start > range.end || range.end > self.len() {
            return None;
        }
        Some(Self {
            bytes: self.bytes.slice(range),
        })
    }

    /// Whether every byte in `range` is zero. Out-of-range is `false`.
    pub fn is_all_zero(&self, range: Range<usize>) -> bool {
        self.get(range)
            .is_some_and(|data| data.iter().all(|&b| b == 0))
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content).unwrap();
        temp_file
    }

    #[test]
    fn open_file_successfully() {
        let file = create_temp_file(b"MZ hello world");
        let buf = Buffer::open(file.path(), &IoConfig::default()).unwrap();
        assert_eq!(buf.len(), 14);
        assert_eq!(&buf[..2], b"MZ");
    }

    #[test]
    fn open_empty_file() {
        let file = create_temp_file(b"");
        let buf = Buffer::open(file.path(), &IoConfig::default()).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn open_file_too_large() {
        let file = create_temp_file(&[0u8; 64]);
        let limits = IoConfig { max_file_size: 32 };
        let err = Buffer::open(file.path(), &limits).unwrap_err();
        assert!(matches!(err, MzError::FileTooLarge { limit: 32, found: 64 }));
    }

    #[test]
    fn clones_alias_memory() {
        let buf = Buffer::from_vec(vec![1, 2, 3, 4]);
        let other = buf.clone();
        assert_eq!(buf.as_slice().as_ptr(), other.as_slice().as_ptr());
        let sub = buf.slice(1..3).unwrap();
        assert_eq!(sub.as_slice(), &[2, 3]);
        assert!(buf.slice(3..9).is_none());
    }

    #[test]
    fn zero_detection() {
        let buf = Buffer::from_vec(vec![0, 0, 1, 0]);
        assert!(buf.is_all_zero(0..2));
        assert!(!buf.is_all_zero(0..3));
        assert!(buf.is_all_zero(4..4));
        assert!(!buf.is_all_zero(2..8));
    }
}
