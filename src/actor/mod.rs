//! Actor base and lifecycle (§4.4).
//!
//! An actor is plain application state plus [`Handler`] implementations for
//! the event types it cares about; [`ActorContext`] is the only way it ever
//! touches the outside world. Everything a [`crate::scheduler::VirtualCore`]
//! needs to drive an actor without knowing its concrete type — construct
//! it, call `on_init`, tear it down — lives behind [`Spawned`], built by
//! [`spawn`].

mod context;
mod traits;

pub use context::ActorContext;
pub use traits::{Actor, Handler, ICallback};

use std::cell::RefCell;
use std::rc::Rc;

use crate::event::CoreOps;
use crate::id::ActorId;

/// A constructed actor, type-erased behind the one operation a
/// [`crate::scheduler::VirtualCore`] must perform on it outside of dispatch:
/// running `on_init`. Event and callback thunks are bound separately
/// through [`ActorContext::register_event`] / `register_callback`, called
/// by the actor's own `on_init`, so `Spawned` itself stays free of any
/// per-event-type generic parameter.
pub struct Spawned {
    id: ActorId,
    init: Box<dyn FnOnce(&mut dyn CoreOps) -> bool>,
}

impl Spawned {
    /// Wrap `actor` for a [`crate::scheduler::VirtualCore`] to construct and
    /// initialize. `id` is the address the engine assigned this actor at
    /// `add_actor` time.
    pub fn new<A: Actor>(id: ActorId, actor: A) -> Self {
        let handle = Rc::new(RefCell::new(actor));
        let init = Box::new(move |core: &mut dyn CoreOps| {
            let mut ctx = ActorContext::new(id, core, Rc::clone(&handle));
            handle.borrow_mut().on_init(&mut ctx)
        });
        Self { id, init }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Run `on_init` against `core`. Returns `false` if the actor should be
    /// discarded before any event is dispatched (§3.1 lifecycle).
    pub fn init(self, core: &mut dyn CoreOps) -> bool {
        (self.init)(core)
    }
}

/// A factory bound to a target core, as recorded by
/// [`crate::engine::Engine::add_actor`]. Constructs the concrete actor only
/// when its assigned [`crate::scheduler::VirtualCore`] starts.
pub type Factory = Box<dyn FnOnce(ActorId) -> Spawned + Send>;
