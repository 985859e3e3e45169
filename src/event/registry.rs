//! Per-VirtualCore type-id → handler-thunk table (ยง4.2).

use std::collections::HashMap;

use crate::id::ActorId;

use super::core_ops::CoreOps;
use super::Frame;

/// Type-erased handler binding. Captures whatever concrete actor handle a
/// `register_event::<E>()` call closed over; invoked with the frame that
/// matched its `(type_id, destination)` pair and the core performing the
/// dispatch, so the handler can build an `ActorContext` for the call.
pub type Thunk = Box<dyn FnMut(Frame, &mut dyn CoreOps)>;

/// Outcome of attempting to dispatch one frame.
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran.
    Dispatched,
    /// No actor has registered a handler for this `(type_id, destination)`.
    NoHandler,
    /// The frame's destination was marked dead before dispatch.
    DeadDestination,
}

/// `type_id -> [(actor_id, thunk)]`. Mutated only between ticks; see
/// `DESIGN.md` for why that is how the "registrations take effect at the
/// next dispatch step" rule is implemented.
#[derive(Default)]
pub struct Registry {
    table: HashMap<u32, Vec<(ActorId, Thunk)>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the handler for `type_id` on `actor`. Registering twice for the
    /// same `(type_id, actor)` replaces the existing thunk.
    pub fn register(&mut self, type_id: u32, actor: ActorId, thunk: Thunk) {
        let entries = self.table.entry(type_id).or_default();
        if let Some(slot) = entries.iter_mut().find(|(id, _)| *id == actor) {
            slot.1 = thunk;
        } else {
            entries.push((actor, thunk));
        }
    }

    /// Remove the handler for `type_id` on `actor`, if any.
    pub fn unregister(&mut self, type_id: u32, actor: ActorId) {
        if let Some(entries) = self.table.get_mut(&type_id) {
            entries.retain(|(id, _)| *id != actor);
        }
    }

    /// Drop every binding for `actor` across all event types. Called once
    /// an actor is removed so stale thunks (and the handles they hold) are
    /// released promptly.
    pub fn remove_actor(&mut self, actor: ActorId) {
        for entries in self.table.values_mut() {
            entries.retain(|(id, _)| *id != actor);
        }
    }

    /// True if some actor has registered an explicit handler for `type_id`.
    pub fn has_any_handler(&self, type_id: u32) -> bool {
        self.table
            .get(&type_id)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Dispatch `frame` to the handler bound to its `(type_id, destination)`
    /// pair, if one exists and the frame was not marked dead at enqueue.
    pub fn dispatch(&mut self, frame: Frame, core: &mut dyn CoreOps) -> DispatchOutcome {
        if !frame.header.alive {
            return DispatchOutcome::DeadDestination;
        }
        let destination = frame.header.destination;
        let type_id = frame.header.type_id;
        let Some(entries) = self.table.get_mut(&type_id) else {
            return DispatchOutcome::NoHandler;
        };
        let Some((_, thunk)) = entries.iter_mut().find(|(id, _)| *id == destination) else {
            return DispatchOutcome::NoHandler;
        };
        thunk(frame, core);
        DispatchOutcome::Dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHeader;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullCoreOps;

    impl CoreOps for NullCoreOps {
        fn core_id(&self) -> u16 {
            0
        }
        fn is_alive(&self, _actor: ActorId) -> bool {
            true
        }
        fn broadcast_targets(&self, _pattern: ActorId) -> Vec<ActorId> {
            Vec::new()
        }
        fn enqueue(&mut self, _destination: ActorId, _frame: Frame) {}
        fn register_thunk(&mut self, _type_id: u32, _actor: ActorId, _thunk: Thunk) {}
        fn unregister_thunk(&mut self, _type_id: u32, _actor: ActorId) {}
        fn register_callback(&mut self, _actor: ActorId, _thunk: crate::event::CallbackThunk) {}
        fn unregister_callback(&mut self, _actor: ActorId) {}
        fn kill(&mut self, _actor: ActorId) {}
        fn schedule_after(
            &mut self,
            _actor: ActorId,
            _delay: std::time::Duration,
            _callback: crate::event::DeferredFn,
        ) {
        }
        fn arm_timer(&mut self, _actor: ActorId, _interval: Option<std::time::Duration>) {}
        fn io_registry(&self) -> &mio::Registry {
            unimplemented!("NullCoreOps has no reactor")
        }
        fn reserve_io_token(&self) -> mio::Token {
            mio::Token(0)
        }
        fn insert_io_source(&mut self, _callback: crate::event::IoSourceFn) -> mio::Token {
            mio::Token(0)
        }
        fn remove_io_source(&mut self, _token: mio::Token) {}
    }

    fn header(type_id: u32, destination: ActorId, alive: bool) -> EventHeader {
        EventHeader {
            type_id,
            source: ActorId::new(1, 0),
            destination,
            alive,
            is_live: false,
            size_bytes: 0,
        }
    }

    #[test]
    fn dispatch_invokes_registered_thunk() {
        let mut registry = Registry::new();
        let calls = Rc::new(RefCell::new(0));
        let calls_clone = calls.clone();
        let actor = ActorId::new(1, 0);
        registry.register(
            7,
            actor,
            Box::new(move |_frame, _core| {
                *calls_clone.borrow_mut() += 1;
            }),
        );
        let frame = Frame::new(header(7, actor, true), 42u32);
        assert_eq!(
            registry.dispatch(frame, &mut NullCoreOps),
            DispatchOutcome::Dispatched
        );
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn dispatch_with_no_handler_reports_no_handler() {
        let mut registry = Registry::new();
        let frame = Frame::new(header(3, ActorId::new(1, 0), true), 0u32);
        assert_eq!(
            registry.dispatch(frame, &mut NullCoreOps),
            DispatchOutcome::NoHandler
        );
    }

    #[test]
    fn dead_frame_is_never_dispatched() {
        let mut registry = Registry::new();
        let actor = ActorId::new(2, 0);
        registry.register(1, actor, Box::new(|_, _| panic!("should not run")));
        let frame = Frame::new(header(1, actor, false), 0u32);
        assert_eq!(
            registry.dispatch(frame, &mut NullCoreOps),
            DispatchOutcome::DeadDestination
        );
    }

    #[test]
    fn re_registering_replaces_the_thunk() {
        let mut registry = Registry::new();
        let actor = ActorId::new(1, 0);
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c1 = calls.clone();
        registry.register(
            1,
            actor,
            Box::new(move |_, _| c1.borrow_mut().push("first")),
        );
        let c2 = calls.clone();
        registry.register(
            1,
            actor,
            Box::new(move |_, _| c2.borrow_mut().push("second")),
        );
        registry.dispatch(Frame::new(header(1, actor, true), 0u32), &mut NullCoreOps);
        assert_eq!(*calls.borrow(), vec!["second"]);
    }

    #[test]
    fn unregister_removes_the_binding() {
        let mut registry = Registry::new();
        let actor = ActorId::new(1, 0);
        registry.register(1, actor, Box::new(|_, _| {}));
        registry.unregister(1, actor);
        let frame = Frame::new(header(1, actor, true), 0u32);
        assert_eq!(
            registry.dispatch(frame, &mut NullCoreOps),
            DispatchOutcome::NoHandler
        );
    }

    #[test]
    fn remove_actor_clears_all_its_bindings() {
        let mut registry = Registry::new();
        let actor = ActorId::new(1, 0);
        registry.register(1, actor, Box::new(|_, _| {}));
        registry.register(2, actor, Box::new(|_, _| {}));
        registry.remove_actor(actor);
        assert!(!registry.has_any_handler(1) || !registry.has_any_handler(2));
    }
}
