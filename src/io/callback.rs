//! `async::callback` equivalent (§4.6): schedule a one-shot closure to run
//! on this actor's own core after a delay, with a fresh [`ActorContext`]
//! built for it exactly as dispatch builds one for a handler.

use std::time::Duration;

use crate::actor::{Actor, ActorContext};
use crate::event::DeferredFn;

impl<'a, A: Actor> ActorContext<'a, A> {
    /// Run `body(actor, ctx)` on this core after `delay`. Never fires
    /// before the current handler returns, and never on another core: the
    /// reactor that owns the timer is the same one driving this actor.
    pub fn schedule_after<F>(&mut self, delay: Duration, body: F)
    where
        F: FnOnce(&mut A, &mut ActorContext<'_, A>) + 'static,
    {
        let id = self.id();
        let handle = self.self_handle();
        let callback: DeferredFn = Box::new(move |core| {
            let mut ctx = ActorContext::new(id, core, handle.clone());
            let mut actor = handle.borrow_mut();
            body(&mut actor, &mut ctx);
        });
        self.raw_core().schedule_after(id, delay, callback);
    }
}
