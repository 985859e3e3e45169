//! `with_timeout` mixin (§4.6): a pseudo-event delivered to `self.on`,
//! re-armed explicitly by the handler rather than auto-repeating.
//!
//! Grounded on `original_source/core/example5_timers.cpp`'s explicit note
//! that the real primitive is a direct reactor timer, not a self-messaging
//! simulation; the example's `DelayedActionMsg` self-send pattern is kept
//! only as the fallback any actor can use without this mixin.

use std::time::Duration;

use crate::actor::{Actor, ActorContext, Handler};
use crate::event::{type_id_of, CoreOps, Event, EventHeader, Frame};
use crate::id::ActorId;

/// Delivered to an actor that has armed a timeout and not yet handled it.
/// Carries nothing beyond identity: the handler already knows what it
/// armed the timer for.
#[derive(Debug, Clone, Copy)]
pub struct TimerEvent;

impl Event for TimerEvent {}

/// Built by the reactor directly (no [`ActorContext`] available from a
/// timer callback); addressed from `actor` to itself.
pub(crate) fn deliver(core: &mut dyn CoreOps, actor: ActorId) {
    let header = EventHeader {
        type_id: type_id_of::<TimerEvent>(),
        source: actor,
        destination: actor,
        alive: core.is_alive(actor),
        is_live: false,
        size_bytes: std::mem::size_of::<TimerEvent>() as u32,
    };
    core.enqueue(actor, Frame::new(header, TimerEvent));
}

/// Actors that want `with_timeout` semantics implement `Handler<TimerEvent>`
/// directly; this marker just documents the intended shape and gives the
/// `ctx.start_timeout` / `ctx.update_timeout` calls a trait bound to hang
/// off.
pub trait WithTimeout: Actor + Handler<TimerEvent> {}
impl<A: Actor + Handler<TimerEvent>> WithTimeout for A {}

impl<'a, A: Actor> ActorContext<'a, A> {
    /// Arm a [`TimerEvent`] to fire after `interval`. Requires `A:
    /// WithTimeout` so the event can actually be delivered once armed.
    pub fn start_timeout(&mut self, interval: Duration)
    where
        A: WithTimeout,
    {
        self.arm_timeout(Some(interval));
    }

    /// Re-arm using the interval last passed to `start_timeout` /
    /// `update_timeout` for this actor.
    pub fn update_timeout(&mut self)
    where
        A: WithTimeout,
    {
        self.arm_timeout(None);
    }

    /// Re-arm with a new interval, replacing the remembered one.
    pub fn update_timeout_with(&mut self, interval: Duration)
    where
        A: WithTimeout,
    {
        self.arm_timeout(Some(interval));
    }

    fn arm_timeout(&mut self, interval: Option<Duration>) {
        let id = self.id();
        self.raw_core().arm_timer(id, interval);
    }
}
