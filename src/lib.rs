//! # tagbuf
//!
//! Tagged binary record encoding with exactly pre-sized buffers.
//!
//! A record is a tree of named, typed fields, possibly nesting other
//! records. It is encoded as a compact byte sequence: each
//! field is written as a 4-byte little-endian type tag followed by its
//! payload, in the order the record's descriptor declares. No field count
//! and no field names go on the wire; order and arity are implied by the
//! descriptor, which both sides must share.
//!
//! The engine computes the exact encoded size of an instance before
//! writing a single byte, allocates one buffer of exactly that size, and
//! never grows it. Decoding checks every read against the buffer's bounds
//! and every tag against the declared kind before trusting a payload; an
//! unrecognized tag is always a failure, never a default value.
//!
//! # Usage
//!
//! Implement [`Record`](record::Record) for your type (or have your field
//! discovery layer generate the impl) and use [`encoding::encode`] /
//! [`encoding::decode`]:
//!
//! ```
//! use tagbuf::prelude::*;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Login {
//!     user: String,
//!     attempts: u32,
//! }
//!
//! impl Record for Login {
//!     fn name() -> &'static str {
//!         "Login"
//!     }
//!
//!     fn empty() -> Self {
//!         Login {
//!             user: String::new(),
//!             attempts: 0,
//!         }
//!     }
//!
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field {
//!                 name: "user",
//!                 kind: Kind::Text,
//!                 get: |r: &Login| Some(Value::Text(r.user.clone())),
//!                 set: |r: &mut Login, v: Value| {
//!                     r.user = v.try_into()?;
//!                     Ok(())
//!                 },
//!             },
//!             Field {
//!                 name: "attempts",
//!                 kind: Kind::U32,
//!                 get: |r: &Login| Some(Value::U32(r.attempts)),
//!                 set: |r: &mut Login, v: Value| {
//!                     r.attempts = v.try_into()?;
//!                     Ok(())
//!                 },
//!             },
//!         ]
//!     }
//! }
//!
//! let login = Login {
//!     user: "ada".to_string(),
//!     attempts: 2,
//! };
//!
//! let buf = encode(&login).unwrap();
//! assert_eq!(size_of(&login).unwrap(), buf.len());
//!
//! let back: Login = decode(&buf).unwrap();
//! assert_eq!(back, login);
//! ```
//!
//! # Wire format
//!
//! Per field, in the record's declared field order:
//!
//! | Part    | Bytes                                                    |
//! | ---     | ---                                                      |
//! | Tag     | 4, little-endian integer                                 |
//! | Payload | fixed width per tag, or `[4-byte byte count][payload]`   |
//!
//! Fixed payload widths: bool 1 (strictly `0`/`1`), i16/u16 2,
//! i32/u32/f32 4, i64/u64/f64 8. Text is UTF-8 and, like raw byte
//! sequences, is prefixed by the byte count of the payload, never a
//! character count; the encoding never varies.
//!
//! A nested record is laid out as its own fields recursively, with no
//! wrapper tag or length around the whole. See [`tag`] for the tag values.
//!
//! # Failure
//!
//! Every failure aborts the whole encode or decode and is reported as a
//! structured [`Error`](errors::Error); no partial buffer or partially
//! populated record is ever handed back.

#![warn(
    deprecated_in_future,
    unsafe_code,
    unused_labels,
    keyword_idents,
    missing_debug_implementations,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]

pub mod cursor;
pub mod diag;
pub mod encoding;
pub mod errors;
pub mod prelude;
pub mod record;
pub mod tag;
mod util;

use bytes::Bytes;
use std::convert::TryFrom;

/// A field value in transit between a record instance and the wire.
///
/// The union is closed and every variant maps to exactly one wire tag (see
/// [`tag`]). Extractions are checked matches: the `TryFrom` impls hand the
/// value back on a variant mismatch instead of casting.
///
/// # Example
///
/// ```
/// use tagbuf::Value;
/// use std::convert::TryFrom;
///
/// let v = Value::from(7i32);
/// assert_eq!(i32::try_from(v), Ok(7));
///
/// let v = Value::from("seven");
/// assert!(i32::try_from(v).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    /// UTF-8 text.
    Text(String),
    /// An opaque byte sequence.
    Bytes(Bytes),
    /// A nested record's field values, in its declared order.
    Record(Vec<Value>),
    /// A value with no wire representation; encoding it always fails.
    Unknown,
}

use Value::*;

impl Value {
    /// A short name for the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Bool(_) => "bool",
            I16(_) => "i16",
            U16(_) => "u16",
            I32(_) => "i32",
            U32(_) => "u32",
            I64(_) => "i64",
            U64(_) => "u64",
            F32(_) => "f32",
            F64(_) => "f64",
            Text(_) => "text",
            Bytes(_) => "bytes",
            Record(_) => "record",
            Unknown => "unknown",
        }
    }
}

from_fn!(Value, bool, Bool);
from_fn!(Value, i16, I16);
from_fn!(Value, u16, U16);
from_fn!(Value, i32, I32);
from_fn!(Value, u32, U32);
from_fn!(Value, i64, I64);
from_fn!(Value, u64, U64);
from_fn!(Value, f32, F32);
from_fn!(Value, f64, F64);
from_fn!(Value, String, Text);

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Text(s.to_string())
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Value {
        Value::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Bytes(Bytes::from(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Value {
        Value::Record(v)
    }
}

try_from_ctor!(Value, bool, Bool);
try_from_ctor!(Value, i16, I16);
try_from_ctor!(Value, u16, U16);
try_from_ctor!(Value, i32, I32);
try_from_ctor!(Value, u32, U32);
try_from_ctor!(Value, i64, I64);
try_from_ctor!(Value, u64, U64);
try_from_ctor!(Value, f32, F32);
try_from_ctor!(Value, f64, F64);
try_from_ctor!(Value, String, Text);

impl TryFrom<Value> for Bytes {
    type Error = Value;

    fn try_from(v: Value) -> Result<Bytes, Value> {
        match v {
            Value::Bytes(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl TryFrom<Value> for Vec<Value> {
    type Error = Value;

    fn try_from(v: Value) -> Result<Vec<Value>, Value> {
        match v {
            Value::Record(values) => Ok(values),
            other => Err(other),
        }
    }
}
