//! Optional diagnostic sinks for encode/decode observation.
//!
//! A sink receives fire-and-forget notifications keyed by field name and
//! buffer offset. It never participates in control flow: errors are still
//! returned to the caller whether or not a sink is installed, and a sink
//! cannot veto or alter an operation.

/// Receiver for per-field trace, warning, and error notifications.
///
/// All methods default to no-ops so an impl only overrides what it wants.
pub trait Diagnostics {
    /// A field was encoded or decoded successfully at `offset`.
    fn trace(&self, _field: &str, _offset: usize, _note: &str) {}

    /// Something suspicious but non-fatal.
    fn warn(&self, _field: &str, _offset: usize, _note: &str) {}

    /// The operation failed at `offset`; the same failure is also returned
    /// to the caller as an [`crate::errors::Error`].
    fn error(&self, _field: &str, _offset: usize, _note: &str) {}
}

/// A sink that forwards notifications to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl Diagnostics for LogSink {
    fn trace(&self, field: &str, offset: usize, note: &str) {
        log::trace!("field `{}` at offset {}: {}", field, offset, note);
    }

    fn warn(&self, field: &str, offset: usize, note: &str) {
        log::warn!("field `{}` at offset {}: {}", field, offset, note);
    }

    fn error(&self, field: &str, offset: usize, note: &str) {
        log::error!("field `{}` at offset {}: {}", field, offset, note);
    }
}
