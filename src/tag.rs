//! The type tag registry.
//!
//! Every value kind that can appear on the wire is identified by a 4-byte
//! little-endian tag written immediately before its payload. The tag set is
//! closed: [`Kind::tag`] and [`Kind::from_tag`] are total functions, with
//! [`TAG_ERROR`] / [`Kind::Unknown`] as the distinguished "no such kind"
//! point on each side. Neither direction ever panics or guesses.
//!
//! [`TAG_RECORD`] is registry-internal: nested records are laid out on the
//! wire as their fields only, with no wrapper tag or length, so the record
//! tag is used for diagnostics but never written.

use crate::record::Shape;
use std::fmt;

/// Width in bytes of a wire tag.
pub const TAG_WIDTH: usize = 4;

/// Tag for an unsupported or unrecognized kind. Always a hard failure.
pub const TAG_ERROR: u32 = 0;
/// Boolean, 1-byte payload, strictly `0` or `1`.
pub const TAG_BOOL: u32 = 1;
/// Signed 16-bit integer.
pub const TAG_I16: u32 = 2;
/// Unsigned 16-bit integer.
pub const TAG_U16: u32 = 3;
/// Signed 32-bit integer.
pub const TAG_I32: u32 = 4;
/// Unsigned 32-bit integer.
pub const TAG_U32: u32 = 5;
/// Signed 64-bit integer.
pub const TAG_I64: u32 = 6;
/// Unsigned 64-bit integer.
pub const TAG_U64: u32 = 7;
/// 32-bit IEEE 754 float.
pub const TAG_F32: u32 = 8;
/// 64-bit IEEE 754 float.
pub const TAG_F64: u32 = 9;
/// UTF-8 text, length-prefixed by encoded byte count.
pub const TAG_TEXT: u32 = 10;
/// Raw byte sequence, length-prefixed by byte count.
pub const TAG_BYTES: u32 = 11;
/// Nested record. Registry-internal, never written to the wire.
pub const TAG_RECORD: u32 = 12;

/// A semantic value kind, as declared by a field descriptor.
#[derive(Clone, Copy, Debug)]
pub enum Kind {
    Bool,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Text,
    Bytes,
    /// A nested record with the given shape.
    Record(&'static Shape),
    /// A kind with no wire representation. Encoding or decoding a field of
    /// this kind fails structurally.
    Unknown,
}

impl Kind {
    /// The wire tag for this kind. Total; unsupported kinds map to
    /// [`TAG_ERROR`] rather than panicking, and callers must treat that tag
    /// as a hard failure for the field.
    pub fn tag(self) -> u32 {
        match self {
            Kind::Bool => TAG_BOOL,
            Kind::I16 => TAG_I16,
            Kind::U16 => TAG_U16,
            Kind::I32 => TAG_I32,
            Kind::U32 => TAG_U32,
            Kind::I64 => TAG_I64,
            Kind::U64 => TAG_U64,
            Kind::F32 => TAG_F32,
            Kind::F64 => TAG_F64,
            Kind::Text => TAG_TEXT,
            Kind::Bytes => TAG_BYTES,
            Kind::Record(_) => TAG_RECORD,
            Kind::Unknown => TAG_ERROR,
        }
    }

    /// The kind a wire tag announces. Total; unrecognized tags map to
    /// [`Kind::Unknown`] so the decoder fails fast instead of guessing.
    /// [`TAG_RECORD`] also maps to `Unknown`: record layouts come from the
    /// out-of-band descriptor, never from the wire.
    pub fn from_tag(tag: u32) -> Kind {
        match tag {
            TAG_BOOL => Kind::Bool,
            TAG_I16 => Kind::I16,
            TAG_U16 => Kind::U16,
            TAG_I32 => Kind::I32,
            TAG_U32 => Kind::U32,
            TAG_I64 => Kind::I64,
            TAG_U64 => Kind::U64,
            TAG_F32 => Kind::F32,
            TAG_F64 => Kind::F64,
            TAG_TEXT => Kind::Text,
            TAG_BYTES => Kind::Bytes,
            _ => Kind::Unknown,
        }
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Kind) -> bool {
        match (self, other) {
            (Kind::Record(a), Kind::Record(b)) => std::ptr::eq(*a, *b),
            _ => self.tag() == other.tag(),
        }
    }
}

impl Eq for Kind {}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::Bool => write!(f, "bool"),
            Kind::I16 => write!(f, "i16"),
            Kind::U16 => write!(f, "u16"),
            Kind::I32 => write!(f, "i32"),
            Kind::U32 => write!(f, "u32"),
            Kind::I64 => write!(f, "i64"),
            Kind::U64 => write!(f, "u64"),
            Kind::F32 => write!(f, "f32"),
            Kind::F64 => write!(f, "f64"),
            Kind::Text => write!(f, "text"),
            Kind::Bytes => write!(f, "bytes"),
            Kind::Record(shape) => write!(f, "record<{}>", shape.name),
            Kind::Unknown => write!(f, "unknown"),
        }
    }
}
