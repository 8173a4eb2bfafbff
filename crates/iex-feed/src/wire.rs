//! Bounds-checked little-endian access to raw datagram bytes.
//!
//! Every field is read at an explicit byte offset with explicit endianness;
//! nothing here depends on host layout or alignment.

/// Byte offsets of the transport segment header fields.
pub mod segment_offsets {
    /// Transport version (u8)
    pub const VERSION: usize = 0;
    /// Reserved, ignored (u8)
    pub const RESERVED: usize = 1;
    /// Message protocol id (u16)
    pub const PROTOCOL: usize = 2;
    /// Channel id (u32)
    pub const CHANNEL: usize = 4;
    /// Session id (u32)
    pub const SESSION: usize = 8;
    /// Payload length (u16)
    pub const LENGTH: usize = 12;
    /// Message count (u16)
    pub const COUNT: usize = 14;
    /// Stream offset (i64)
    pub const OFFSET: usize = 16;
    /// First sequence number (i64)
    pub const FIRST_SEQ: usize = 24;
    /// Send time (i64 ns)
    pub const SEND_TIME: usize = 32;
    /// First message length prefix
    pub const MESSAGES: usize = 40;
}

/// Read-only view over a byte buffer with checked field access
#[derive(Debug, Clone, Copy)]
pub struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    /// Wrap a buffer
    #[inline]
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Total number of bytes
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left from `offset` to the end, zero past the end
    #[inline]
    #[must_use]
    pub fn remaining_from(&self, offset: usize) -> usize {
        self.buf.len().saturating_sub(offset)
    }

    /// `len` bytes starting at `offset`
    #[inline]
    #[must_use]
    pub fn bytes_at(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        self.buf.get(offset..end)
    }

    /// Fixed-size array starting at `offset`
    #[inline]
    #[must_use]
    pub fn array_at<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.bytes_at(offset, N)?.try_into().ok()
    }

    /// u8 at `offset`
    #[inline]
    #[must_use]
    pub fn u8_at(&self, offset: usize) -> Option<u8> {
        self.buf.get(offset).copied()
    }

    /// Little-endian u16 at `offset`
    #[inline]
    #[must_use]
    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        self.array_at(offset).map(u16::from_le_bytes)
    }

    /// Little-endian u32 at `offset`
    #[inline]
    #[must_use]
    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        self.array_at(offset).map(u32::from_le_bytes)
    }

    /// Little-endian i64 at `offset`
    #[inline]
    #[must_use]
    pub fn i64_at(&self, offset: usize) -> Option<i64> {
        self.array_at(offset).map(i64::from_le_bytes)
    }
}

/// Append-only little-endian encoder
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with preallocated capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a u8
    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    /// Append a little-endian u16
    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a little-endian u32
    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a little-endian i64
    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append raw bytes
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Finish and return the encoded bytes
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
