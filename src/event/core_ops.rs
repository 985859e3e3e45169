//! The core-facing surface a dispatch thunk needs at call time.
//!
//! A [`super::registry::Thunk`] is stored for the lifetime of a
//! registration, far longer than any single [`crate::scheduler::VirtualCore`]
//! borrow can live, so it cannot close over a core reference. Instead every
//! dispatch call hands the thunk a fresh `&mut dyn CoreOps`, implemented by
//! whichever [`crate::scheduler::VirtualCore`] is doing the dispatching.
//! Kept here (not in `actor`) so the event layer has no dependency on the
//! actor layer.

use std::time::Duration;

use crate::id::ActorId;

use super::registry::Thunk;
use super::Frame;

/// A type-erased `on_callback` invocation, closed over the same actor
/// handle a [`Thunk`] would be (§4.4, `register_callback`).
pub type CallbackThunk = Box<dyn FnMut(&mut dyn CoreOps)>;

/// A type-erased one-shot callback for `ActorContext::schedule` /
/// `async::callback` (§4.6), run once its delay elapses.
pub type DeferredFn = Box<dyn FnOnce(&mut dyn CoreOps)>;

/// Readiness bits for a registered I/O source, copied out of the
/// underlying `mio::event::Event` before a callback runs (§5, reactor
/// bridge) so the callback never has to borrow the reactor's event buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Readiness {
    pub readable: bool,
    pub writable: bool,
    pub error: bool,
}

/// A callback driven by socket/file readiness, installed by a transport
/// (`tcp`/`udp`/`ssl`/`file_watch`) through [`CoreOps::insert_io_source`].
pub type IoSourceFn = Box<dyn FnMut(Readiness, &mut dyn CoreOps)>;

/// Object-safe core operations an [`crate::actor::ActorContext`] forwards to.
pub trait CoreOps {
    fn core_id(&self) -> u16;

    /// Whether `actor` is currently registered and alive on its core.
    /// `actor` is always a concrete id; broadcast patterns are resolved by
    /// [`CoreOps::broadcast_targets`] before this is ever called with them.
    fn is_alive(&self, actor: ActorId) -> bool;

    /// Resolve a broadcast pattern (§4.1) to the concrete actor ids it
    /// addresses, so the caller can enqueue one copy per recipient.
    /// Membership reflects the roster assigned at `Engine::start()`, not
    /// current liveness — a dead recipient is still returned and then
    /// dropped normally by the per-recipient `enqueue`/`is_alive` check.
    fn broadcast_targets(&self, pattern: ActorId) -> Vec<ActorId>;

    /// Route `frame` toward `destination`, local or remote. `destination`
    /// is always a concrete id.
    fn enqueue(&mut self, destination: ActorId, frame: Frame);

    /// Install `thunk` as the handler for `type_id` on `actor`, effective
    /// at the next dispatch step.
    fn register_thunk(&mut self, type_id: u32, actor: ActorId, thunk: Thunk);

    /// Remove the handler for `type_id` on `actor`, effective at the next
    /// dispatch step.
    fn unregister_thunk(&mut self, type_id: u32, actor: ActorId);

    /// Install `thunk` as `actor`'s per-tick callback and mark it active.
    /// A second call replaces the thunk and leaves membership unchanged.
    fn register_callback(&mut self, actor: ActorId, thunk: CallbackThunk);

    /// Remove `actor` from the set invoked each tick. The thunk, if any,
    /// stays installed so a later `register_callback` need not re-supply
    /// it, but it will not run until re-registered.
    fn unregister_callback(&mut self, actor: ActorId);

    /// Tear the actor down immediately: drop its handle, clear its
    /// registrations, mark it dead in the liveness table.
    fn kill(&mut self, actor: ActorId);

    /// Run `callback` on this core after `delay` (§4.6 `async::callback`).
    /// Guaranteed to run on the same core that scheduled it, never before
    /// the calling handler returns.
    fn schedule_after(&mut self, actor: ActorId, delay: Duration, callback: DeferredFn);

    /// Arm a `with_timeout` delivery for `actor`. `None` re-arms with the
    /// interval last passed here; `Some(d)` sets and remembers `d`.
    fn arm_timer(&mut self, actor: ActorId, interval: Option<Duration>);

    /// The `mio::Registry` a transport must register its raw socket/file
    /// source with, using the `mio::Token` returned by
    /// [`CoreOps::insert_io_source`].
    fn io_registry(&self) -> &mio::Registry;

    /// Predict the token [`CoreOps::insert_io_source`] will hand back for
    /// the very next call, so a transport can register its raw socket with
    /// `io_registry()` *before* the callback (which typically needs to own
    /// that same socket) is installed. Valid only if no other
    /// `insert_io_source`/`remove_io_source` call happens in between.
    fn reserve_io_token(&self) -> mio::Token;

    /// Reserve a readiness-driven callback slot and return the token to
    /// register the underlying source under. Safe to call re-entrantly
    /// from inside another source's own callback (e.g. a TCP listener
    /// accepting a connection and registering it immediately).
    fn insert_io_source(&mut self, callback: IoSourceFn) -> mio::Token;

    /// Drop the callback installed at `token`. A no-op if it was already
    /// removed (e.g. by itself, on disconnect).
    fn remove_io_source(&mut self, token: mio::Token);
}
