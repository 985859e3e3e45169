//! The set of actors whose `on_callback` runs once per tick, in
//! registration order (§4.3 step 3).

use std::collections::{HashMap, HashSet};

use crate::event::CallbackThunk;
use crate::event::CoreOps;
use crate::id::ActorId;

#[derive(Default)]
pub struct CallbackTable {
    order: Vec<ActorId>,
    thunks: HashMap<ActorId, CallbackThunk>,
    active: HashSet<ActorId>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `register_callback(); register_callback();` collapses to one
    /// registration (§8 idempotence): a second call just replaces the
    /// thunk and leaves this actor's place in `order` untouched.
    pub fn register(&mut self, actor: ActorId, thunk: CallbackThunk) {
        if !self.thunks.contains_key(&actor) {
            self.order.push(actor);
        }
        self.thunks.insert(actor, thunk);
        self.active.insert(actor);
    }

    /// A no-op if `actor` was never registered (§8 idempotence).
    pub fn unregister(&mut self, actor: ActorId) {
        self.active.remove(&actor);
    }

    /// Drop every trace of `actor`, called once it is removed from the
    /// core entirely.
    pub fn remove_actor(&mut self, actor: ActorId) {
        self.active.remove(&actor);
        self.thunks.remove(&actor);
        self.order.retain(|id| *id != actor);
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Invoke every active actor's callback, in registration order. Runs
    /// at most once per tick; never re-entrant with a handler since the
    /// caller only reaches this between dispatch steps.
    pub fn run_all(&mut self, core: &mut dyn CoreOps) -> bool {
        let mut ran_any = false;
        for actor in self.order.clone() {
            if self.active.contains(&actor) {
                if let Some(thunk) = self.thunks.get_mut(&actor) {
                    thunk(core);
                    ran_any = true;
                }
            }
        }
        ran_any
    }

    /// Currently-active actors, in registration order. Used by the drive
    /// loop to run each callback individually (rather than through
    /// [`CallbackTable::run_all`]) so one actor's callback panicking
    /// doesn't skip every actor registered after it.
    pub(crate) fn active_order(&self) -> Vec<ActorId> {
        self.order
            .iter()
            .copied()
            .filter(|actor| self.active.contains(actor))
            .collect()
    }

    /// Take `actor`'s thunk out of the table so the drive loop can invoke it
    /// with `core` aliasing the table's own owner (see `VirtualCore::tick`).
    pub(crate) fn take_thunk(&mut self, actor: ActorId) -> Option<CallbackThunk> {
        self.thunks.remove(&actor)
    }

    /// Put a thunk previously removed by [`CallbackTable::take_thunk`] back.
    /// A no-op on membership: `order`/`active` are untouched, so a thunk put
    /// back for an actor `unregister_callback`d in the meantime just sits
    /// inert until re-activated.
    pub(crate) fn put_thunk(&mut self, actor: ActorId, thunk: CallbackThunk) {
        self.thunks.insert(actor, thunk);
    }
}
