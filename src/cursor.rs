//! Bounds-checked read and write heads over fixed-length byte sequences.
//!
//! This is the only module that touches raw bytes. A [`WriteCursor`] owns an
//! exactly-sized buffer and a write offset; a [`ReadCursor`] borrows a slice
//! and a read offset. Every put writes exactly the wire width at the current
//! offset and advances by that width; every get mirrors it. An operation
//! that would run past the end of the buffer fails with [`CursorError`]
//! before any out-of-range access.
//!
//! Chunks (text and raw byte sequences) are written as a 4-byte
//! little-endian length prefix followed by the payload. The prefix is always
//! derived from the payload slice itself, so the only representable quantity
//! is the byte count of what actually gets written; a character count cannot
//! be smuggled in.
//!
//! A failed put leaves bytes written before the failure point in place; the
//! encoder treats such a buffer as poisoned and never hands it out.

use bytes::Bytes;
use std::convert::TryFrom;

/// Width in bytes of a chunk length prefix.
pub const LEN_WIDTH: usize = 4;

/// A bounds violation or malformed primitive, reported by a cursor.
///
/// Cursors know offsets but not field names; the encoding layer maps these
/// into [`crate::errors::Error`] with the field attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorError {
    /// The operation needed `needed` bytes at offset `at`, past the end.
    Bounds { at: usize, needed: usize },
    /// A chunk length prefix at `at` claimed more bytes than remain.
    Prefix {
        at: usize,
        claimed: usize,
        available: usize,
    },
    /// A chunk payload too long to count with a 4-byte prefix.
    Oversize { at: usize, len: usize },
    /// A boolean payload byte that was neither `0` nor `1`.
    Bool { at: usize, byte: u8 },
}

macro_rules! put_prim {
    ($put:ident, $t:ty) => {
        /// Writes the value little-endian at the current offset.
        pub fn $put(&mut self, v: $t) -> Result<(), CursorError> {
            self.put_raw(&v.to_le_bytes())
        }
    };
}

macro_rules! get_prim {
    ($get:ident, $t:ty, $width:expr) => {
        /// Reads a little-endian value at the current offset.
        pub fn $get(&mut self) -> Result<$t, CursorError> {
            let raw = self.get_raw($width)?;
            let mut le = [0u8; $width];
            le.copy_from_slice(raw);
            Ok(<$t>::from_le_bytes(le))
        }
    };
}

/// Write head over an owned, exactly-sized buffer.
///
/// The buffer never grows: it is allocated once, to the size the size
/// calculator reported, and [`finish`](WriteCursor::finish) hands it out
/// only after the caller has confirmed every byte was written.
#[derive(Debug)]
pub struct WriteCursor {
    buf: Vec<u8>,
    pos: usize,
}

impl WriteCursor {
    /// A cursor over a zeroed buffer of exactly `len` bytes.
    pub fn exact(len: usize) -> WriteCursor {
        WriteCursor {
            buf: vec![0; len],
            pos: 0,
        }
    }

    /// Current write offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn put_raw(&mut self, bytes: &[u8]) -> Result<(), CursorError> {
        if self.remaining() < bytes.len() {
            return Err(CursorError::Bounds {
                at: self.pos,
                needed: bytes.len(),
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Writes a boolean as a single `0`/`1` byte.
    pub fn put_bool(&mut self, v: bool) -> Result<(), CursorError> {
        self.put_raw(&[v as u8])
    }

    put_prim!(put_i16, i16);
    put_prim!(put_u16, u16);
    put_prim!(put_i32, i32);
    put_prim!(put_u32, u32);
    put_prim!(put_i64, i64);
    put_prim!(put_u64, u64);
    put_prim!(put_f32, f32);
    put_prim!(put_f64, f64);

    /// Writes a 4-byte little-endian byte count followed by the payload.
    pub fn put_chunk(&mut self, payload: &[u8]) -> Result<(), CursorError> {
        let count = u32::try_from(payload.len()).map_err(|_| CursorError::Oversize {
            at: self.pos,
            len: payload.len(),
        })?;
        self.put_u32(count)?;
        self.put_raw(payload)
    }

    /// Consumes the cursor, handing out the buffer.
    pub fn finish(self) -> Bytes {
        debug_assert_eq!(self.pos, self.buf.len());
        Bytes::from(self.buf)
    }
}

/// Read head over a borrowed buffer. Never mutates the source.
#[derive(Clone, Debug)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    /// A cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> ReadCursor<'a> {
        ReadCursor { buf, pos: 0 }
    }

    /// A cursor at offset `pos`, which must lie within the buffer.
    pub fn at(buf: &'a [u8], pos: usize) -> Result<ReadCursor<'a>, CursorError> {
        if pos > buf.len() {
            Err(CursorError::Bounds { at: pos, needed: 0 })
        } else {
            Ok(ReadCursor { buf, pos })
        }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn get_raw(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        if self.remaining() < n {
            return Err(CursorError::Bounds {
                at: self.pos,
                needed: n,
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Reads a boolean payload byte, rejecting anything but `0` and `1`.
    pub fn get_bool(&mut self) -> Result<bool, CursorError> {
        let at = self.pos;
        match self.get_raw(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(CursorError::Bool { at, byte }),
        }
    }

    get_prim!(get_i16, i16, 2);
    get_prim!(get_u16, u16, 2);
    get_prim!(get_i32, i32, 4);
    get_prim!(get_u32, u32, 4);
    get_prim!(get_i64, i64, 8);
    get_prim!(get_u64, u64, 8);
    get_prim!(get_f32, f32, 4);
    get_prim!(get_f64, f64, 8);

    /// Reads a 4-byte byte count and then that many payload bytes.
    ///
    /// A prefix claiming more than the remaining bytes is a
    /// [`CursorError::Prefix`], reported before any payload read.
    pub fn get_chunk(&mut self) -> Result<&'a [u8], CursorError> {
        let at = self.pos;
        let claimed = self.get_u32()? as usize;
        if self.remaining() < claimed {
            return Err(CursorError::Prefix {
                at,
                claimed,
                available: self.remaining(),
            });
        }
        self.get_raw(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_primitives() {
        let mut w = WriteCursor::exact(2 + 4 + 8 + 1);
        w.put_i16(-300).unwrap();
        w.put_u32(7).unwrap();
        w.put_f64(1.5).unwrap();
        w.put_bool(true).unwrap();
        assert_eq!(w.remaining(), 0);
        let buf = w.finish();

        let mut r = ReadCursor::new(&buf);
        assert_eq!(r.get_i16().unwrap(), -300);
        assert_eq!(r.get_u32().unwrap(), 7);
        assert_eq!(r.get_f64().unwrap(), 1.5);
        assert!(r.get_bool().unwrap());
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn writes_are_little_endian() {
        let mut w = WriteCursor::exact(4);
        w.put_u32(0x0403_0201).unwrap();
        assert_eq!(&w.finish()[..], [1, 2, 3, 4]);
    }

    #[test]
    fn put_past_end_is_a_bounds_error() {
        let mut w = WriteCursor::exact(3);
        w.put_u16(1).unwrap();
        assert_eq!(
            w.put_u32(2),
            Err(CursorError::Bounds { at: 2, needed: 4 })
        );
    }

    #[test]
    fn get_past_end_is_a_bounds_error() {
        let mut r = ReadCursor::new(&[1, 2]);
        assert_eq!(
            r.get_u32(),
            Err(CursorError::Bounds { at: 0, needed: 4 })
        );
        // the failed get did not advance
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn chunk_prefix_counts_payload_bytes() {
        let mut w = WriteCursor::exact(LEN_WIDTH + 5);
        w.put_chunk(b"hello").unwrap();
        let buf = w.finish();
        assert_eq!(&buf[..4], [5, 0, 0, 0]);
        assert_eq!(&buf[4..], *b"hello");

        let mut r = ReadCursor::new(&buf);
        assert_eq!(r.get_chunk().unwrap(), b"hello");
    }

    #[test]
    fn lying_chunk_prefix_is_rejected() {
        // prefix says 10 bytes, only 2 follow
        let buf = [10, 0, 0, 0, b'a', b'b'];
        let mut r = ReadCursor::new(&buf);
        assert_eq!(
            r.get_chunk(),
            Err(CursorError::Prefix {
                at: 0,
                claimed: 10,
                available: 2
            })
        );
    }

    #[test]
    fn bad_bool_byte_is_rejected() {
        let mut r = ReadCursor::new(&[2]);
        assert_eq!(r.get_bool(), Err(CursorError::Bool { at: 0, byte: 2 }));
    }

    #[test]
    fn cursor_at_out_of_range_position() {
        assert!(ReadCursor::at(&[0, 1], 3).is_err());
        assert!(ReadCursor::at(&[0, 1], 2).is_ok());
    }
}
