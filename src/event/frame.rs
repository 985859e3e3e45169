//! The queued unit moved through a mailbox.
//!
//! The design spec models a mailbox as a byte ring holding `{header, opaque
//! payload bytes}` frames, because the source framework places events
//! directly into a shared memory pool. Rust's type system gives us a safer
//! equivalent with the same backpressure and ordering properties: a
//! frame-granular bounded queue of `(header, boxed payload)` pairs. The ring
//! still backpressures on frame *count*, not byte count, which is the one
//! place this translation narrows the original "byte-granular" wording (see
//! `DESIGN.md`).

use std::any::Any;

use super::EventHeader;

/// One event in transit: its header plus a type-erased, heap-boxed payload.
///
/// `is_live` on the header mirrors the source framework's "owns resources
/// that must be destructed in place" flag; in Rust this is just `Drop`, run
/// automatically when the `Box` is dropped after the handler returns.
pub struct Frame {
    pub header: EventHeader,
    pub payload: Box<dyn Any + Send>,
}

impl Frame {
    pub fn new<E: Send + 'static>(header: EventHeader, payload: E) -> Self {
        Self {
            header,
            payload: Box::new(payload),
        }
    }

    /// Recover the concrete payload. Panics if `type_id` in the header does
    /// not match `E` — this is a dispatch bug (the registry is keyed by the
    /// same type id used here), never a user-triggerable condition.
    pub fn into_payload<E: 'static>(self) -> E {
        *self
            .payload
            .downcast::<E>()
            .unwrap_or_else(|_| panic!("frame payload type mismatch for type_id {}", self.header.type_id))
    }
}
