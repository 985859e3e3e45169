//! The traits application code implements (§4.4, §6.1).

use super::context::ActorContext;
use crate::event::Event;

/// A single actor. Owned exclusively by one [`crate::scheduler::VirtualCore`]
/// for its whole lifetime; never touched from any other thread.
///
/// `on_init` is the only required method — an actor with no event handlers
/// is legal (if useless), so registering for events is something the actor
/// does itself inside `on_init` via [`ActorContext::register_event`], not
/// something the trait forces on every implementor.
pub trait Actor: Sized + 'static {
    /// Called once after construction, before any event is dispatched.
    /// Returning `false` discards the actor immediately: it is never
    /// scheduled, never receives `on_init` again, and its id is retired.
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool;
}

/// Binds a concrete handler for event type `E` on actor `A`. An actor may
/// implement this for as many event types as it registers for via
/// [`ActorContext::register_event`].
pub trait Handler<E: Event>: Actor {
    fn on(&mut self, event: E, ctx: &mut ActorContext<'_, Self>);
}

/// Opts an actor into a per-tick callback (§4.5's drain-order step 3).
/// Invoked at most once per scheduler tick, never re-entrantly with any
/// event handler, and never after the actor has been killed.
pub trait ICallback: Actor {
    fn on_callback(&mut self, ctx: &mut ActorContext<'_, Self>);
}
