//! Typed events and the per-core dispatch registry.
//!
//! An event is a header (ยง3.1) plus an opaque payload. The header carries
//! enough identity (`type_id`, `source`, `destination`) for a [`VirtualCore`]
//! to route it without knowing the concrete payload type; the payload is
//! recovered by a type-specific handler thunk installed via
//! [`Registry::register`].
//!
//! [`VirtualCore`]: crate::scheduler::VirtualCore

mod core_ops;
mod frame;
mod registry;
mod type_id;

pub use core_ops::{CallbackThunk, CoreOps, DeferredFn, IoSourceFn, Readiness};
pub use frame::Frame;
pub use registry::{DispatchOutcome, Registry, Thunk};
pub use type_id::type_id_of;

use crate::id::ActorId;

/// Marker trait for event payload types.
///
/// `Send` is required because an event may cross from a producing core to a
/// consuming core's inbound ring. Implementors are ordinary structs/enums;
/// there is nothing to implement beyond the blanket bound.
pub trait Event: Send + 'static {}

impl<T: Send + 'static> Event for T {}

/// Fixed-size metadata carried by every event, independent of payload type.
#[derive(Debug, Clone, Copy)]
pub struct EventHeader {
    pub type_id: u32,
    pub source: ActorId,
    pub destination: ActorId,
    pub alive: bool,
    pub is_live: bool,
    pub size_bytes: u32,
}

/// Every actor implicitly handles this; the default behavior is to call
/// `kill()`. Re-registering `KillEvent` with [`Registry::register`] replaces
/// the default with a user handler (ยง4.2).
#[derive(Debug, Clone, Copy)]
pub struct KillEvent;
