//! Binary writer for building little-endian file images in memory.
//!
//! This module provides [`BinaryWriter`], a growable buffer with positioned
//! backpatching. Container headers carry section offsets that are only known
//! once the sections are written, so the writer can reserve a placeholder
//! u32 and patch it later.

use zerocopy::{Immutable, IntoBytes};

/// A growable little-endian byte buffer.
#[derive(Debug, Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

/// Position of a reserved u32 placeholder, to be filled in with
/// [`BinaryWriter::patch_u32`].
#[derive(Debug, Clone, Copy)]
pub struct Patch(usize);

impl BinaryWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    /// Current length of the buffer, which is also the write position.
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Append raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Append a little-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian u64.
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a struct using zerocopy.
    #[inline]
    pub fn write_struct<T: IntoBytes + Immutable>(&mut self, value: &T) {
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Reserve a u32 placeholder at the current position.
    ///
    /// Writes four zero bytes and returns a [`Patch`] that can later be
    /// filled in once the real value is known.
    pub fn reserve_u32(&mut self) -> Patch {
        let at = self.buf.len();
        self.buf.extend_from_slice(&[0, 0, 0, 0]);
        Patch(at)
    }

    /// Fill in a previously reserved u32 placeholder.
    pub fn patch_u32(&mut self, patch: Patch, value: u32) {
        self.buf[patch.0..patch.0 + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Zero-pad the buffer up to the next multiple of `align`.
    pub fn pad_to(&mut self, align: usize) {
        while self.buf.len() % align != 0 {
            self.buf.push(0);
        }
    }

    /// Consume the writer and return the finished buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_primitives() {
        let mut w = BinaryWriter::new();
        w.write_u8(0x2A);
        w.write_u16(0xBEEF);
        w.write_u32(0x04030201);

        assert_eq!(w.into_inner(), [0x2A, 0xEF, 0xBE, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_reserve_and_patch() {
        let mut w = BinaryWriter::new();
        w.write_u32(1);
        let patch = w.reserve_u32();
        w.write_u32(3);
        w.patch_u32(patch, 2);

        assert_eq!(w.into_inner(), [1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
    }

    #[test]
    fn test_pad_to() {
        let mut w = BinaryWriter::new();
        w.write_bytes(b"abc");
        w.pad_to(4);
        assert_eq!(w.position(), 4);

        // Already aligned: no padding added.
        w.pad_to(4);
        assert_eq!(w.position(), 4);
    }
}
