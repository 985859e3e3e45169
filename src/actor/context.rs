//! The handle a running actor uses to talk back to its core (ยง4.4).

use std::cell::RefCell;
use std::rc::Rc;

use crate::event::{type_id_of, CallbackThunk, CoreOps, Event, EventHeader, Frame, Thunk};
use crate::id::ActorId;

use super::traits::{Actor, Handler, ICallback};

/// Everything a `Handler::on` or `Actor::on_init` call needs: this actor's
/// own id, the source of the event currently being handled (if any), and a
/// route back into the owning core for sends, registrations and self-kill.
///
/// `current_source` is set by the dispatch thunk from the frame's header
/// before the handler runs, which is what lets [`ActorContext::reply`] and
/// [`ActorContext::forward`] address the *original* sender rather than this
/// actor.
pub struct ActorContext<'a, A: Actor> {
    id: ActorId,
    current_source: Option<ActorId>,
    core: &'a mut dyn CoreOps,
    self_handle: Rc<RefCell<A>>,
}

impl<'a, A: Actor> ActorContext<'a, A> {
    pub(crate) fn new(id: ActorId, core: &'a mut dyn CoreOps, self_handle: Rc<RefCell<A>>) -> Self {
        Self {
            id,
            current_source: None,
            core,
            self_handle,
        }
    }

    pub(crate) fn with_source(
        id: ActorId,
        source: ActorId,
        core: &'a mut dyn CoreOps,
        self_handle: Rc<RefCell<A>>,
    ) -> Self {
        Self {
            id,
            current_source: Some(source),
            core,
            self_handle,
        }
    }

    /// This actor's own address.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// The sender of the event currently being handled, if this call was
    /// reached through event dispatch rather than `on_init`/a callback.
    pub fn source(&self) -> Option<ActorId> {
        self.current_source
    }

    pub fn core_id(&self) -> u16 {
        self.core.core_id()
    }

    /// Point-to-point send: `destination` must name a single concrete
    /// actor, never a broadcast id (use the `broadcast*` family for that —
    /// fan-out needs to duplicate the payload, which requires `E: Clone`).
    fn send(&mut self, source: ActorId, destination: ActorId, event: impl Event) {
        let alive = self.core.is_alive(destination);
        let header = EventHeader {
            type_id: type_id_of_val(&event),
            source,
            destination,
            alive,
            is_live: false,
            size_bytes: std::mem::size_of_val(&event) as u32,
        };
        self.core.enqueue(destination, Frame::new(header, event));
    }

    /// Fan out `event` to every concrete actor matching `pattern` (§4.1):
    /// one clone per recipient, enqueued exactly like a point-to-point
    /// send so the destination core's liveness check still applies.
    fn send_broadcast<E: Event + Clone>(&mut self, source: ActorId, pattern: ActorId, event: E) {
        for target in self.core.broadcast_targets(pattern) {
            self.send(source, target, event.clone());
        }
    }

    /// Send `event` to `destination`, tagging it with this actor as source.
    /// `destination` must be a concrete actor id, not a broadcast pattern.
    pub fn push<E: Event>(&mut self, destination: ActorId, event: E) {
        self.send(self.id, destination, event);
    }

    /// Send `event` back to the source of the event currently being
    /// handled. A no-op if there is no current source (e.g. from
    /// `on_init`).
    pub fn reply<E: Event>(&mut self, event: E) {
        if let Some(source) = self.current_source {
            self.send(self.id, source, event);
        }
    }

    /// Send `event` to `destination`, preserving the *original* source of
    /// the event currently being handled rather than substituting this
    /// actor's own id.
    pub fn forward<E: Event>(&mut self, destination: ActorId, event: E) {
        let source = self.current_source.unwrap_or(self.id);
        self.send(source, destination, event);
    }

    /// Send `event` to every actor on every core.
    pub fn broadcast<E: Event + Clone>(&mut self, event: E) {
        self.send_broadcast(self.id, ActorId::broadcast_everywhere(), event);
    }

    /// Send `event` to the given service id on every core.
    pub fn broadcast_all_cores<E: Event + Clone>(&mut self, service_id: u16, event: E) {
        self.send_broadcast(self.id, ActorId::broadcast_all_cores(service_id), event);
    }

    /// Send `event` to every actor on this actor's own core.
    pub fn broadcast_core<E: Event + Clone>(&mut self, event: E) {
        let pattern = ActorId::broadcast_id(self.core.core_id());
        self.send_broadcast(self.id, pattern, event);
    }

    /// Bind `A`'s handler for `E`, effective starting the next dispatch
    /// step. Requires `A: Handler<E>`.
    pub fn register_event<E>(&mut self)
    where
        E: Event,
        A: Handler<E>,
    {
        let handle = Rc::clone(&self.self_handle);
        let actor_id = self.id;
        let thunk: Thunk = Box::new(move |frame: Frame, core: &mut dyn CoreOps| {
            let source = frame.header.source;
            let event = frame.into_payload::<E>();
            let mut ctx = ActorContext::with_source(actor_id, source, core, Rc::clone(&handle));
            handle.borrow_mut().on(event, &mut ctx);
        });
        self.core.register_thunk(type_id_of::<E>(), actor_id, thunk);
    }

    /// Remove this actor's binding for `E`, effective starting the next
    /// dispatch step.
    pub fn unregister_event<E: Event>(&mut self) {
        self.core.unregister_thunk(type_id_of::<E>(), self.id);
    }

    /// Opt this actor into a per-tick [`ICallback::on_callback`] invocation,
    /// effective starting the next tick. Calling this twice collapses to a
    /// single registration (§8, Register/Unregister Callback idempotence).
    pub fn register_callback(&mut self)
    where
        A: ICallback,
    {
        let handle = Rc::clone(&self.self_handle);
        let actor_id = self.id;
        let thunk: CallbackThunk = Box::new(move |core: &mut dyn CoreOps| {
            let mut ctx = ActorContext::new(actor_id, core, Rc::clone(&handle));
            handle.borrow_mut().on_callback(&mut ctx);
        });
        self.core.register_callback(actor_id, thunk);
    }

    pub fn unregister_callback(&mut self) {
        self.core.unregister_callback(self.id);
    }

    /// Tear this actor down immediately.
    pub fn kill(&mut self) {
        self.core.kill(self.id);
    }

    /// Escape hatch for sibling modules (`io::timer`, `io::tcp`, ...) that
    /// need to reach the core directly rather than through one of the
    /// methods above. `core` itself stays private so ordinary handler code
    /// only ever sees the typed surface.
    pub(crate) fn raw_core(&mut self) -> &mut dyn CoreOps {
        self.core
    }

    /// Clone of this actor's own handle, for sibling modules building a
    /// fresh `ActorContext` outside of dispatch (`io::callback`).
    pub(crate) fn self_handle(&self) -> Rc<RefCell<A>> {
        Rc::clone(&self.self_handle)
    }
}

fn type_id_of_val<E: Event>(_event: &E) -> u32 {
    type_id_of::<E>()
}
