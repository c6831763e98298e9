//! Contains [`ByteCursor`], a bounds-checked little-endian reader.
//!
//! All the formats here are little-endian and built out of unsigned
//! bytes, so everything downstream of this reader works on `u8`/`u16`/`u32`
//! and never has to worry about sign extension.

use crate::error::{DecodeError, Result};

use std::io::Cursor;

use binrw::{BinRead, Endian};

/// Sequential reader over a byte slice with an explicit position.
///
/// Construction never fails. Any read that would go past the end
/// of the slice returns [`DecodeError::TruncatedInput`] and leaves
/// the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying buffer.
    #[inline]
    #[must_use]
    pub const fn total_len(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes left after [`Self::position`].
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// The whole underlying buffer.
    #[inline]
    #[must_use]
    pub const fn get_ref(&self) -> &'a [u8] {
        self.buf
    }

    /// Returns `Ok(end)` if `wanted` bytes can be read at `offset`.
    fn check(&self, offset: usize, wanted: usize) -> Result<usize> {
        offset
            .checked_add(wanted)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::TruncatedInput {
                offset,
                wanted,
                len: self.buf.len(),
            })
    }

    /// Moves to an absolute offset. Seeking to the very end is allowed.
    ///
    /// ## Errors
    ///
    /// If `pos` is past the end of the buffer.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        self.check(pos, 0)?;
        self.pos = pos;
        Ok(())
    }

    /// Advances by `n` bytes.
    ///
    /// ## Errors
    ///
    /// If fewer than `n` bytes remain.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.pos = self.check(self.pos, n)?;
        Ok(())
    }

    /// Reads `n` bytes and advances past them.
    ///
    /// ## Errors
    ///
    /// If fewer than `n` bytes remain.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.check(self.pos, n)?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a fixed-size array and advances past it.
    ///
    /// ## Errors
    ///
    /// If fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads one byte.
    ///
    /// ## Errors
    ///
    /// If the cursor is at the end of the buffer.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a little-endian `u16`.
    ///
    /// ## Errors
    ///
    /// If fewer than 2 bytes remain.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Reads a little-endian `u32`.
    ///
    /// ## Errors
    ///
    /// If fewer than 4 bytes remain.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads a RIFF fourcc (e.g, `b"anih"`).
    ///
    /// ## Errors
    ///
    /// If fewer than 4 bytes remain.
    pub fn read_tag(&mut self) -> Result<[u8; 4]> {
        self.read_array()
    }

    /// Reads a little-endian `u32` at `offset` without moving the cursor.
    ///
    /// ## Errors
    ///
    /// If `offset + 4` is past the end of the buffer.
    pub fn peek_u32_le(&self, offset: usize) -> Result<u32> {
        let end = self.check(offset, 4)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.buf[offset..end]);
        Ok(u32::from_le_bytes(out))
    }

    /// Returns `len` bytes starting at `offset` without moving the cursor.
    ///
    /// ## Errors
    ///
    /// If the range isn't fully inside the buffer.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = self.check(offset, len)?;
        Ok(&self.buf[offset..end])
    }

    /// Reads a little-endian [`binrw`] record and advances past it.
    ///
    /// ## Errors
    ///
    /// If the record doesn't fit in the remaining bytes.
    pub fn read_struct<T>(&mut self) -> Result<T>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        let mut reader = Cursor::new(&self.buf[self.pos..]);

        match T::read_options(&mut reader, Endian::Little, ()) {
            Ok(value) => {
                // can't exceed `remaining()`, so this always fits
                let consumed = usize::try_from(reader.position()).unwrap_or(usize::MAX);
                self.skip(consumed)?;
                Ok(value)
            }

            // derived records wrap field errors in backtraces, `is_eof` looks through them
            Err(err) if err.is_eof() => {
                Err(DecodeError::TruncatedInput {
                    offset: self.pos,
                    wanted: size_of::<T>(),
                    len: self.buf.len(),
                })
            }

            Err(err) => Err(DecodeError::header(format!(
                "malformed record at offset={}: {err}",
                self.pos
            ))),
        }
    }
}
