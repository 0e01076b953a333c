//! Size calculation, encoding, and decoding of records.
//!
//! The three walks share one layout rule: per field, a 4-byte tag followed
//! by the payload, with nested records flattened in place (their fields
//! only, no wrapper tag or length). [`size_of`] projects that layout to a
//! byte count without writing; [`Encoder`] allocates exactly that many
//! bytes once and fills them; [`Decoder`] walks the same descriptor back,
//! checking every tag against the declared kind before trusting a payload.
//!
//! Field values are extracted exactly once per encode, so the size the
//! buffer was allocated with and the bytes written always describe the same
//! values; on success the final write offset equals the buffer length.
//!
//! Every failure aborts the whole call. An encode that fails returns no
//! buffer and a decode that fails returns no instance; the cursor involved
//! is consumed and never reused.

use crate::{
    cursor::{CursorError, ReadCursor, WriteCursor, LEN_WIDTH},
    diag::Diagnostics,
    errors::Error,
    record::{Record, Shape},
    tag::{Kind, TAG_WIDTH},
    Value,
};
use bytes::Bytes;
use std::{convert::TryFrom, fmt};

/// The exact number of bytes `rec` will occupy once encoded.
///
/// Purely a projection: allocates no buffer and mutates nothing. The
/// encoder uses the same per-field costs, so this equals the length of the
/// buffer [`encode`] returns for the same instance.
pub fn size_of<R: Record>(rec: &R) -> Result<usize, Error> {
    let values = rec.to_values()?;
    record_size(R::shape(), &values, 0)
}

fn record_size(shape: &Shape, values: &[Value], at: usize) -> Result<usize, Error> {
    if values.len() != shape.fields.len() {
        return Err(Error::structural(
            shape.name,
            Kind::Unknown,
            at,
            format!(
                "expected {} field values, got {}",
                shape.fields.len(),
                values.len()
            ),
        ));
    }
    let mut total = 0;
    for (fld, value) in shape.fields.iter().zip(values) {
        let (name, kind) = *fld;
        total += field_size(name, kind, value, at + total)?;
    }
    Ok(total)
}

fn field_size(field: &'static str, kind: Kind, value: &Value, at: usize) -> Result<usize, Error> {
    let payload = match (kind, value) {
        (Kind::Bool, Value::Bool(_)) => 1,
        (Kind::I16, Value::I16(_)) | (Kind::U16, Value::U16(_)) => 2,
        (Kind::I32, Value::I32(_)) | (Kind::U32, Value::U32(_)) | (Kind::F32, Value::F32(_)) => 4,
        (Kind::I64, Value::I64(_)) | (Kind::U64, Value::U64(_)) | (Kind::F64, Value::F64(_)) => 8,
        (Kind::Text, Value::Text(s)) => chunk_size(field, s.as_bytes(), at)?,
        (Kind::Bytes, Value::Bytes(b)) => chunk_size(field, &b[..], at)?,
        // nested records cost the sum of their fields, nothing more
        (Kind::Record(shape), Value::Record(values)) => return record_size(shape, values, at),
        (Kind::Unknown, _) => {
            return Err(Error::structural(
                field,
                Kind::Unknown,
                at,
                "kind has no wire tag",
            ));
        }
        (kind, value) => {
            return Err(Error::structural(
                field,
                kind,
                at,
                format!("value is a {}, not a {}", value.kind_name(), kind),
            ));
        }
    };
    Ok(TAG_WIDTH + payload)
}

fn chunk_size(field: &'static str, payload: &[u8], at: usize) -> Result<usize, Error> {
    if u32::try_from(payload.len()).is_err() {
        return Err(Error::value(
            field,
            at,
            format!(
                "payload of {} bytes cannot be counted by a 4-byte prefix",
                payload.len()
            ),
        ));
    }
    Ok(LEN_WIDTH + payload.len())
}

fn wire_error(field: &'static str, kind: Kind, e: CursorError) -> Error {
    match e {
        CursorError::Bounds { at, needed } => Error::structural(
            field,
            kind,
            at,
            format!("needed {} bytes past the end of the buffer", needed),
        ),
        // a lying prefix is a bounds problem: trusting it would read past
        // the end of the buffer
        CursorError::Prefix {
            at,
            claimed,
            available,
        } => Error::structural(
            field,
            kind,
            at,
            format!(
                "length prefix claims {} bytes, only {} remain",
                claimed, available
            ),
        ),
        CursorError::Oversize { at, len } => Error::value(
            field,
            at,
            format!("payload of {} bytes cannot be counted by a 4-byte prefix", len),
        ),
        CursorError::Bool { at, byte } => Error::value(
            field,
            at,
            format!("boolean payload byte {:#04x} is neither 0 nor 1", byte),
        ),
    }
}

/// Walks a record's fields in declared order, writing tagged values into an
/// exactly pre-sized buffer.
#[derive(Clone, Copy, Default)]
pub struct Encoder<'d> {
    diag: Option<&'d dyn Diagnostics>,
}

impl<'d> fmt::Debug for Encoder<'d> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("diag", &self.diag.is_some())
            .finish()
    }
}

impl<'d> Encoder<'d> {
    /// An encoder with no diagnostic sink.
    pub fn new() -> Encoder<'d> {
        Encoder { diag: None }
    }

    /// An encoder that notifies `diag` per field and on failure. The sink
    /// never affects the outcome.
    pub fn with_diagnostics(diag: &'d dyn Diagnostics) -> Encoder<'d> {
        Encoder { diag: Some(diag) }
    }

    /// Encodes `rec` into a freshly allocated buffer of exactly its
    /// computed size. On failure no buffer is returned.
    pub fn encode<R: Record>(&self, rec: &R) -> Result<Bytes, Error> {
        let res = self.encode_inner(rec);
        if let (Some(diag), Err(e)) = (self.diag, &res) {
            diag.error(e.field(), e.offset(), &e.to_string());
        }
        res
    }

    fn encode_inner<R: Record>(&self, rec: &R) -> Result<Bytes, Error> {
        let shape = R::shape();
        let values = rec.to_values()?;
        let total = record_size(shape, &values, 0)?;
        let mut cur = WriteCursor::exact(total);
        self.write_record(&mut cur, shape, &values)?;
        if cur.remaining() != 0 {
            // size/write disagreement is a bug in this module, but it must
            // surface as an error, not as a corrupt buffer
            return Err(Error::structural(
                shape.name,
                Kind::Unknown,
                cur.position(),
                format!(
                    "encoder stopped {} bytes short of the computed size",
                    cur.remaining()
                ),
            ));
        }
        Ok(cur.finish())
    }

    fn write_record(
        &self,
        cur: &mut WriteCursor,
        shape: &Shape,
        values: &[Value],
    ) -> Result<(), Error> {
        for (fld, value) in shape.fields.iter().zip(values) {
            let (name, kind) = *fld;
            self.write_field(cur, name, kind, value)?;
        }
        Ok(())
    }

    fn write_field(
        &self,
        cur: &mut WriteCursor,
        field: &'static str,
        kind: Kind,
        value: &Value,
    ) -> Result<(), Error> {
        let start = cur.position();
        match (kind, value) {
            (Kind::Record(shape), Value::Record(values)) => {
                return self.write_record(cur, shape, values);
            }
            (Kind::Unknown, _) => {
                return Err(Error::structural(
                    field,
                    Kind::Unknown,
                    start,
                    "kind has no wire tag",
                ));
            }
            _ => {}
        }
        cur.put_u32(kind.tag())
            .map_err(|e| wire_error(field, kind, e))?;
        match (kind, value) {
            (Kind::Bool, Value::Bool(b)) => cur.put_bool(*b),
            (Kind::I16, Value::I16(n)) => cur.put_i16(*n),
            (Kind::U16, Value::U16(n)) => cur.put_u16(*n),
            (Kind::I32, Value::I32(n)) => cur.put_i32(*n),
            (Kind::U32, Value::U32(n)) => cur.put_u32(*n),
            (Kind::I64, Value::I64(n)) => cur.put_i64(*n),
            (Kind::U64, Value::U64(n)) => cur.put_u64(*n),
            (Kind::F32, Value::F32(x)) => cur.put_f32(*x),
            (Kind::F64, Value::F64(x)) => cur.put_f64(*x),
            (Kind::Text, Value::Text(s)) => cur.put_chunk(s.as_bytes()),
            (Kind::Bytes, Value::Bytes(b)) => cur.put_chunk(&b[..]),
            (kind, value) => {
                return Err(Error::structural(
                    field,
                    kind,
                    start,
                    format!("value is a {}, not a {}", value.kind_name(), kind),
                ));
            }
        }
        .map_err(|e| wire_error(field, kind, e))?;
        if let Some(diag) = self.diag {
            diag.trace(field, start, "encoded");
        }
        Ok(())
    }
}

/// Walks a descriptor's fields in declared order, reading tagged values out
/// of a borrowed buffer and assigning them into a fresh instance.
#[derive(Clone, Copy, Default)]
pub struct Decoder<'d> {
    diag: Option<&'d dyn Diagnostics>,
}

impl<'d> fmt::Debug for Decoder<'d> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("diag", &self.diag.is_some())
            .finish()
    }
}

impl<'d> Decoder<'d> {
    /// A decoder with no diagnostic sink.
    pub fn new() -> Decoder<'d> {
        Decoder { diag: None }
    }

    /// A decoder that notifies `diag` per field and on failure. The sink
    /// never affects the outcome.
    pub fn with_diagnostics(diag: &'d dyn Diagnostics) -> Decoder<'d> {
        Decoder { diag: Some(diag) }
    }

    /// Decodes an instance from the start of `buf`.
    pub fn decode<R: Record>(&self, buf: &[u8]) -> Result<R, Error> {
        self.decode_at(buf, 0)
    }

    /// Decodes an instance starting at byte offset `pos`. The buffer is
    /// never mutated; on failure no instance is returned.
    pub fn decode_at<R: Record>(&self, buf: &[u8], pos: usize) -> Result<R, Error> {
        let res = self.decode_inner(buf, pos);
        if let (Some(diag), Err(e)) = (self.diag, &res) {
            diag.error(e.field(), e.offset(), &e.to_string());
        }
        res
    }

    fn decode_inner<R: Record>(&self, buf: &[u8], pos: usize) -> Result<R, Error> {
        let desc = R::descriptor();
        let mut cur = ReadCursor::at(buf, pos).map_err(|_| {
            Error::structural(
                desc.shape.name,
                Kind::Unknown,
                pos,
                "start position outside the buffer",
            )
        })?;
        let mut rec = R::empty();
        for f in &desc.fields {
            let start = cur.position();
            let value = self.read_field(&mut cur, f.name, f.kind)?;
            (f.set)(&mut rec, value).map_err(|e| e.into_error(f.name, f.kind, start))?;
            if let Some(diag) = self.diag {
                diag.trace(f.name, start, "decoded");
            }
        }
        Ok(rec)
    }

    fn read_record(&self, cur: &mut ReadCursor, shape: &'static Shape) -> Result<Value, Error> {
        let mut values = Vec::with_capacity(shape.fields.len());
        for fld in &shape.fields {
            let (name, kind) = *fld;
            values.push(self.read_field(cur, name, kind)?);
        }
        Ok(Value::Record(values))
    }

    fn read_field(
        &self,
        cur: &mut ReadCursor,
        field: &'static str,
        kind: Kind,
    ) -> Result<Value, Error> {
        match kind {
            // nested records are untagged on the wire
            Kind::Record(shape) => return self.read_record(cur, shape),
            Kind::Unknown => {
                return Err(Error::structural(
                    field,
                    Kind::Unknown,
                    cur.position(),
                    "kind has no wire tag",
                ));
            }
            _ => {}
        }
        let at = cur.position();
        let tag = cur.get_u32().map_err(|e| wire_error(field, kind, e))?;
        if tag != kind.tag() {
            return Err(Error::structural(
                field,
                kind,
                at,
                format!("wire tag {} announces {}", tag, Kind::from_tag(tag)),
            ));
        }
        let value = match kind {
            Kind::Bool => Value::Bool(cur.get_bool().map_err(|e| wire_error(field, kind, e))?),
            Kind::I16 => Value::I16(cur.get_i16().map_err(|e| wire_error(field, kind, e))?),
            Kind::U16 => Value::U16(cur.get_u16().map_err(|e| wire_error(field, kind, e))?),
            Kind::I32 => Value::I32(cur.get_i32().map_err(|e| wire_error(field, kind, e))?),
            Kind::U32 => Value::U32(cur.get_u32().map_err(|e| wire_error(field, kind, e))?),
            Kind::I64 => Value::I64(cur.get_i64().map_err(|e| wire_error(field, kind, e))?),
            Kind::U64 => Value::U64(cur.get_u64().map_err(|e| wire_error(field, kind, e))?),
            Kind::F32 => Value::F32(cur.get_f32().map_err(|e| wire_error(field, kind, e))?),
            Kind::F64 => Value::F64(cur.get_f64().map_err(|e| wire_error(field, kind, e))?),
            Kind::Text => {
                let chunk = cur.get_chunk().map_err(|e| wire_error(field, kind, e))?;
                let s = std::str::from_utf8(chunk)
                    .map_err(|_| Error::value(field, at, "text payload is not valid UTF-8"))?;
                Value::Text(s.to_string())
            }
            Kind::Bytes => {
                let chunk = cur.get_chunk().map_err(|e| wire_error(field, kind, e))?;
                Value::Bytes(Bytes::from(chunk.to_vec()))
            }
            Kind::Record(_) | Kind::Unknown => unreachable!("handled before the tag read"),
        };
        Ok(value)
    }
}

/// Encodes a record with no diagnostic sink.
pub fn encode<R: Record>(rec: &R) -> Result<Bytes, Error> {
    Encoder::new().encode(rec)
}

/// Decodes a record from the start of `buf` with no diagnostic sink.
pub fn decode<R: Record>(buf: &[u8]) -> Result<R, Error> {
    Decoder::new().decode(buf)
}

/// Decodes a record starting at byte offset `pos`.
pub fn decode_at<R: Record>(buf: &[u8], pos: usize) -> Result<R, Error> {
    Decoder::new().decode_at(buf, pos)
}
