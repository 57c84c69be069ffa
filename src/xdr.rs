//! Bounds-checked big-endian XDR primitive reading over an in-memory buffer.
//!
//! Grounded on the teacher crate's `parser::primitive` module, which reads the same primitives
//! off an `impl Read`. The attribute decoder (§4.3 of `SPEC_FULL.md`) needs to reject a read
//! that would run past the end of a fixed-length slice rather than block waiting for more
//! bytes, so [`Cursor`] tracks a position into a borrowed `&[u8]` instead of wrapping a stream.

use byteorder::{BigEndian, ByteOrder};

use crate::error::Error;

/// The XDR alignment, in bytes: every opaque/string is zero-padded to a multiple of this.
pub const ALIGNMENT: usize = 4;

fn short_buffer() -> Error {
    Error::InvalidData("not enough data in fattr4".into())
}

/// A read-only cursor over a byte slice with bounds-checked XDR primitive reads.
///
/// Mirrors the `(cursor, remaining)` pair the distilled spec's design notes call for (§9):
/// every `read_*` method checks `remaining()` before touching the slice, so a truncated or
/// adversarial blob fails with [`Error::InvalidData`] instead of panicking or reading
/// out of bounds.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// `true` once every byte of the buffer has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < n {
            return Err(short_buffer());
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consumes the zero-padding bytes following an opaque/string of length `n`.
    fn padding(&mut self, n: usize) -> Result<(), Error> {
        let pad = (ALIGNMENT - n % ALIGNMENT) % ALIGNMENT;
        self.take(pad)?;
        Ok(())
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    /// Reads a length-prefixed opaque/string, consuming the trailing zero padding.
    pub fn read_opaque(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        self.padding(len)?;
        Ok(bytes)
    }

    /// Reads a length-prefixed `bitmap4`: a `u32` word count followed by that many `u32`s.
    pub fn read_bitmap(&mut self) -> Result<Vec<u32>, Error> {
        let count = self.read_u32()? as usize;
        (0..count).map(|_| self.read_u32()).collect()
    }
}

/// Encodes a `bitmap4` (length-prefixed `u32` words) into `out`, big-endian.
pub fn write_bitmap(out: &mut Vec<u8>, words: &[u32]) {
    out.extend_from_slice(&(words.len() as u32).to_be_bytes());
    for word in words {
        out.extend_from_slice(&word.to_be_bytes());
    }
}

/// Encodes a length-prefixed opaque, zero-padded to a 4-byte boundary.
pub fn write_opaque(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
    let pad = (ALIGNMENT - bytes.len() % ALIGNMENT) % ALIGNMENT;
    out.extend(std::iter::repeat(0u8).take(pad));
}
