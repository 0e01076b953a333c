//! Structured encode/decode failures.
//!
//! Every failure aborts the whole encode or decode call: no partial buffer
//! and no partially populated record is ever handed back, and nothing is
//! retried. The two kinds mirror the two ways a call can go wrong: the
//! schema and the bytes disagree ([`Error::Structural`]), or the data
//! itself is unusable ([`Error::Value`]).

use crate::tag::Kind;
use failure::Fail;

/// An encode or decode failure.
#[derive(Clone, Debug, PartialEq, Fail)]
pub enum Error {
    /// An unsupported kind, a tag that disagrees with the declared kind, or
    /// a read/write that would leave the buffer's bounds, including a length
    /// prefix claiming more bytes than the buffer holds.
    #[fail(
        display = "structural error on field `{}` at offset {}: expected {}, {}",
        field, offset, expected, detail
    )]
    Structural {
        /// The field being encoded or decoded when the failure occurred.
        field: &'static str,
        /// The kind the descriptor declares for that field.
        expected: Kind,
        /// Byte offset into the buffer at the point of failure.
        offset: usize,
        detail: String,
    },
    /// A required value that was absent at encode time, or a payload whose
    /// content is unusable (bad bool byte, invalid UTF-8 text, a chunk too
    /// long for its 4-byte count prefix).
    #[fail(display = "value error on field `{}` at offset {}: {}", field, offset, detail)]
    Value {
        field: &'static str,
        /// Byte offset into the buffer, `0` when the failure precedes any
        /// buffer layout.
        offset: usize,
        detail: String,
    },
}

impl Error {
    pub(crate) fn structural(
        field: &'static str,
        expected: Kind,
        offset: usize,
        detail: impl Into<String>,
    ) -> Error {
        Error::Structural {
            field,
            expected,
            offset,
            detail: detail.into(),
        }
    }

    pub(crate) fn value(field: &'static str, offset: usize, detail: impl Into<String>) -> Error {
        Error::Value {
            field,
            offset,
            detail: detail.into(),
        }
    }

    /// The field the failure is attributed to.
    pub fn field(&self) -> &'static str {
        match self {
            Error::Structural { field, .. } | Error::Value { field, .. } => field,
        }
    }

    /// Byte offset at the point of failure.
    pub fn offset(&self) -> usize {
        match self {
            Error::Structural { offset, .. } | Error::Value { offset, .. } => *offset,
        }
    }

    /// Whether this is a schema/bytes disagreement.
    pub fn is_structural(&self) -> bool {
        match self {
            Error::Structural { .. } => true,
            Error::Value { .. } => false,
        }
    }
}
