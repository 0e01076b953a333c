//! Convenient wildcard import for implementing and using records.

pub use crate::{
    cursor::{CursorError, ReadCursor, WriteCursor},
    diag::{Diagnostics, LogSink},
    encoding::{decode, decode_at, encode, size_of, Decoder, Encoder},
    errors::Error,
    record::{nested, Descriptor, Field, Record, SetError, Shape},
    tag::Kind,
    Value,
};

pub use bytes::Bytes;
pub use std::convert::{TryFrom, TryInto};
