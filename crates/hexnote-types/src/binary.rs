//! The binary source boundary.
//!
//! Annotations never own the bytes they describe. Interpreters read through
//! the [`Binary`] trait, which any random-access backing store can implement.
//! [`ByteBinary`] is the in-memory implementation used by the CLI and tests.

use std::path::Path;

use bytes::Bytes;

use crate::error::TypeError;
use crate::range::Range;

/// Random-access, read-only byte source.
///
/// Reads past [`length`](Binary::length) fail with
/// [`TypeError::OutOfRange`]; they are never truncated.
pub trait Binary {
    /// Total number of bytes available.
    fn length(&self) -> u64;

    /// Read a single byte.
    fn read(&self, position: u64) -> Result<u8, TypeError>;

    /// Fill `buf` with the bytes starting at `position`.
    ///
    /// Default implementation calls `read()` for each byte. Backends may
    /// override for better performance.
    fn read_into(&self, position: u64, buf: &mut [u8]) -> Result<(), TypeError> {
        for (offset, slot) in buf.iter_mut().enumerate() {
            *slot = self.read(position + offset as u64)?;
        }
        Ok(())
    }

    /// Copy out every byte covered by `range`.
    fn read_range(&self, range: Range) -> Result<Vec<u8>, TypeError> {
        if range.end() > self.length() {
            return Err(TypeError::OutOfRange {
                position: range.end() - 1,
                length: self.length(),
            });
        }
        let mut buf = vec![0u8; range.length() as usize];
        self.read_into(range.position(), &mut buf)?;
        Ok(buf)
    }
}

/// An in-memory [`Binary`] over a shared, immutable byte buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteBinary {
    data: Bytes,
}

impl ByteBinary {
    /// Wrap an existing buffer.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Load a whole file into memory.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::new(data))
    }

    /// The underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for ByteBinary {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&'static [u8]> for ByteBinary {
    fn from(data: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(data))
    }
}

impl Binary for ByteBinary {
    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, position: u64) -> Result<u8, TypeError> {
        usize::try_from(position)
            .ok()
            .and_then(|index| self.data.get(index).copied())
            .ok_or(TypeError::OutOfRange {
                position,
                length: self.length(),
            })
    }

    fn read_into(&self, position: u64, buf: &mut [u8]) -> Result<(), TypeError> {
        let end = position
            .checked_add(buf.len() as u64)
            .filter(|end| *end <= self.length())
            .ok_or(TypeError::OutOfRange {
                position: position.saturating_add(buf.len() as u64).saturating_sub(1),
                length: self.length(),
            })?;
        buf.copy_from_slice(&self.data[position as usize..end as usize]);
        Ok(())
    }
}
