//! Pull-based byte sources the container parser reads from.
//!
//! The decoder only ever consumes fully buffered data: it asks how many bytes are left
//! and pulls up to N of them at a time. It never takes ownership of the buffer, so a
//! caller may [`rewind`](MemoryStream::rewind) a [`MemoryStream`] and open the same
//! bytes again.

use core::fmt;

// Re-export ErrorKind for error construction
pub use embedded_io::ErrorKind;

/// I/O error type used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoError {
    kind: ErrorKind,
}

impl IoError {
    /// Create a new error from an ErrorKind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I/O error: {:?}", self.kind)
    }
}

impl core::error::Error for IoError {}

impl From<ErrorKind> for IoError {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result type for I/O operations.
pub type Result<T> = core::result::Result<T, IoError>;

/// An in-memory byte sequence with a read cursor.
pub trait ByteSource {
    /// Number of bytes that can still be read.
    fn remaining(&self) -> usize;

    /// Pull up to `buf.len()` bytes, returning how many were copied.
    ///
    /// Returns `0` only when the source is exhausted or `buf` is empty.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Read exact number of bytes or error.
    fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.read(buf) {
                0 => return Err(IoError::new(ErrorKind::Other)), // UnexpectedEof
                n => buf = &mut buf[n..],
            }
        }
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn remaining(&self) -> usize {
        (**self).remaining()
    }

    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> usize {
        (**self).read(buf)
    }
}

// Consuming reads from a byte slice
impl ByteSource for &[u8] {
    #[inline]
    fn remaining(&self) -> usize {
        self.len()
    }

    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let amt = core::cmp::min(buf.len(), self.len());
        let (a, b) = self.split_at(amt);
        buf[..amt].copy_from_slice(a);
        *self = b;
        amt
    }
}

/// A read cursor over a caller-owned buffer.
///
/// ```
/// use gif_canvas::io::{ByteSource, MemoryStream};
///
/// let data = [1u8, 2, 3];
/// let mut stream = MemoryStream::new(&data);
/// let mut buf = [0; 2];
/// assert_eq!(stream.read(&mut buf), 2);
/// assert_eq!(stream.remaining(), 1);
/// stream.rewind();
/// assert_eq!(stream.remaining(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MemoryStream<'a> {
    /// Creates a cursor positioned at the first byte of `data`.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next byte to be read.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor back to byte 0.
    #[inline]
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// Gets the underlying buffer.
    #[inline]
    pub fn get_ref(&self) -> &'a [u8] {
        self.data
    }
}

impl ByteSource for MemoryStream<'_> {
    #[inline]
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut rest = &self.data[self.pos..];
        let amt = rest.read(buf);
        self.pos += amt;
        amt
    }
}

#[cfg(feature = "std")]
impl<T: AsRef<[u8]>> ByteSource for std::io::Cursor<T> {
    fn remaining(&self) -> usize {
        let len = self.get_ref().as_ref().len();
        usize::try_from(self.position()).map_or(0, |pos| len.saturating_sub(pos))
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let amt = core::cmp::min(buf.len(), self.remaining());
        if amt == 0 {
            return 0;
        }
        let start = self.get_ref().as_ref().len() - self.remaining();
        buf[..amt].copy_from_slice(&self.get_ref().as_ref()[start..start + amt]);
        self.set_position((start + amt) as u64);
        amt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_exact_fails_when_exhausted() {
        let data = [7u8, 8];
        let mut stream = MemoryStream::new(&data);
        let mut buf = [0u8; 3];
        assert!(stream.read_exact(&mut buf).is_err());
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn slice_source_consumes() {
        let mut data: &[u8] = &[1, 2, 3, 4];
        let mut buf = [0u8; 3];
        data.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(data.remaining(), 1);
    }

    #[test]
    fn rewind_allows_rereading() {
        let data = [5u8, 6, 7];
        let mut stream = MemoryStream::new(&data);
        let mut buf = [0u8; 3];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(stream.position(), 3);
        stream.rewind();
        let mut again = [0u8; 3];
        stream.read_exact(&mut again).unwrap();
        assert_eq!(buf, again);
    }

    #[cfg(feature = "std")]
    #[test]
    fn cursor_source() {
        let mut cursor = std::io::Cursor::new(alloc::vec![1u8, 2, 3, 4, 5]);
        let mut buf = [0u8; 2];
        assert_eq!(cursor.read(&mut buf), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(cursor.remaining(), 3);
        cursor.set_position(0);
        assert_eq!(cursor.remaining(), 5);
    }
}
