//! One OS thread's worth of runtime: actor registry, per-tick callbacks and
//! the I/O reactor, all driven by a single cooperative loop (§4, §4.3).
//!
//! `VirtualCore` also implements [`CoreOps`], the interface every
//! [`ActorContext`](crate::actor::ActorContext) talks to. That creates one
//! recurring shape problem: a handler thunk stored in `self.registry` needs
//! to be called with `core: &mut dyn CoreOps` pointing at the very
//! `VirtualCore` that owns `self.registry`, and the borrow checker will not
//! let a method call alias `self.FIELD` (the receiver) with `self` (an
//! argument reachable from that same call). `registry.dispatch(frame, self)`
//! and `callbacks.run_all(core)` are worked around by moving the table out
//! of `self` with [`std::mem::take`] before the call and restoring it after
//! — the table is briefly its own `Default` value, which is empty and
//! therefore never legitimately touched by the dispatch in flight. The
//! reactor takes a different path: see [`VirtualCore::drive_reactor`].
//!
//! `register_thunk`/`unregister_thunk`/`register_callback`/
//! `unregister_callback` never touch `self.registry`/`self.callbacks`
//! directly for the same reason — a handler calling
//! `ctx.register_event::<E>()` reaches `CoreOps::register_thunk` while
//! `self.registry` may be the very table mid-`mem::take`. They buffer into
//! `pending_ops` instead, flushed at the top of the next tick, which is
//! also exactly the "registrations take effect at the next dispatch step"
//! rule (§4.2, `DESIGN.md`).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mio::Token;

use crate::actor::Spawned;
use crate::error::CoreError;
use crate::event::{
    type_id_of, CallbackThunk, CoreOps, DeferredFn, DispatchOutcome, EventHeader, Frame,
    IoSourceFn, KillEvent, Readiness, Registry, Thunk,
};
use crate::id::ActorId;
use crate::io::reactor::Reactor;
use crate::mailbox::{MailboxError, Mailboxes};

use super::{CallbackTable, CoreMetrics, Roster};

/// Scalar tunables a [`VirtualCore`] needs beyond its fabric/roster
/// assignment. Mirrors the handful of knobs `crate::engine::EngineConfig`
/// exposes per core.
#[derive(Debug, Clone, Copy)]
pub struct VirtualCoreConfig {
    /// Cooperative-spin budget for a cross-core send before it is reported
    /// as [`CoreError::Backpressure`] (§4.3).
    pub max_spins: u32,
    /// `mio::Events` buffer size for one `poll_ready` call.
    pub reactor_event_capacity: usize,
    /// Upper bound on how long an idle core blocks on reactor readiness
    /// before re-checking its mailboxes and stop flag.
    pub idle_backoff: Duration,
    /// Consecutive ticks that must make no progress before the core blocks
    /// on reactor readiness (§4.3 step 5's "N consecutive ticks").
    pub idle_ticks_before_block: u32,
}

impl Default for VirtualCoreConfig {
    fn default() -> Self {
        Self {
            max_spins: 1000,
            reactor_event_capacity: 256,
            idle_backoff: Duration::from_millis(50),
            idle_ticks_before_block: 16,
        }
    }
}

/// §4.5's lifecycle states for one core's run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

enum PendingOp {
    RegisterThunk(u32, ActorId, Thunk),
    UnregisterThunk(u32, ActorId),
    RegisterCallback(ActorId, CallbackThunk),
    UnregisterCallback(ActorId),
}

/// One core's whole runtime: the actors pinned to it, their dispatch and
/// callback tables, its slice of the mailbox fabric, and its I/O reactor.
/// Lives on exactly one OS thread for its whole life — nothing here is
/// `Sync`, and nothing needs to be.
pub struct VirtualCore {
    core_id: u16,
    mailboxes: Mailboxes,
    registry: Registry,
    callbacks: CallbackTable,
    reactor: Reactor,
    roster: Roster,
    metrics: Arc<CoreMetrics>,
    pending_ops: Vec<PendingOp>,
    pending_kills: Vec<ActorId>,
    actor_count: usize,
    state: CoreState,
    stop_flag: Arc<AtomicBool>,
    fatal: Arc<AtomicBool>,
    config: VirtualCoreConfig,
}

impl VirtualCore {
    pub fn new(
        core_id: u16,
        mailboxes: Mailboxes,
        roster: Roster,
        metrics: Arc<CoreMetrics>,
        stop_flag: Arc<AtomicBool>,
        fatal: Arc<AtomicBool>,
        config: VirtualCoreConfig,
    ) -> std::io::Result<Self> {
        Ok(Self {
            core_id,
            mailboxes,
            registry: Registry::new(),
            callbacks: CallbackTable::new(),
            reactor: Reactor::new(config.reactor_event_capacity)?,
            roster,
            metrics,
            pending_ops: Vec::new(),
            pending_kills: Vec::new(),
            actor_count: 0,
            state: CoreState::Starting,
            stop_flag,
            fatal,
            config,
        })
    }

    pub fn core_id(&self) -> u16 {
        self.core_id
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn metrics(&self) -> &Arc<CoreMetrics> {
        &self.metrics
    }

    pub fn actor_count(&self) -> usize {
        self.actor_count
    }

    /// Construct `spawned` on this core: install its implicit `KillEvent`
    /// handler, mark it alive, then run `on_init`. `on_init` may itself
    /// register a real `KillEvent` handler, replacing the default one
    /// (§4.2) — this happens through the normal deferred path since
    /// `init()` calls back into `self` as `&mut dyn CoreOps`.
    pub fn spawn(&mut self, spawned: Spawned) -> Result<ActorId, CoreError> {
        let id = spawned.id();
        let default_kill: Thunk = Box::new(move |_frame, core| core.kill(id));
        self.registry.register(type_id_of::<KillEvent>(), id, default_kill);
        self.mailboxes.liveness().mark_alive(id.service_id);
        self.actor_count += 1;
        self.metrics
            .actors_alive
            .store(self.actor_count as u64, Ordering::Relaxed);

        if spawned.init(self) {
            Ok(id)
        } else {
            self.metrics.init_failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(actor = %id, "on_init returned false, discarding actor");
            self.kill_now(id);
            self.apply_pending_kills();
            Err(CoreError::InitFailed { id })
        }
    }

    /// Run one iteration of the drain order: flush deferred registrations
    /// from the previous tick, dispatch every frame currently queued,
    /// remove anything killed during dispatch, run per-tick callbacks,
    /// remove anything killed during callbacks, then drive the reactor
    /// (§4.3). Returns whether any of that actually did something, so the
    /// run loop knows whether it may back off.
    pub fn tick(&mut self) -> bool {
        self.metrics.ticks.fetch_add(1, Ordering::Relaxed);
        self.flush_pending_ops();

        let mut frames = Vec::new();
        self.mailboxes.drain_into(&mut frames);
        let dispatched_any = !frames.is_empty();
        for frame in frames {
            self.dispatch_one(frame);
        }
        self.apply_pending_kills();

        let ran_callback = self.run_callbacks();
        self.apply_pending_kills();

        let reactor_busy = self.drive_reactor();

        dispatched_any || ran_callback || reactor_busy
    }

    /// Run ticks until this core's natural exit condition is reached (no
    /// actors, no outstanding reactor work, nothing in the callback table)
    /// or the engine's shared stop flag asks for a shutdown (§4.5).
    pub fn run(&mut self) {
        self.state = CoreState::Running;
        let mut idle_ticks: u32 = 0;
        loop {
            if self.fatal.load(Ordering::Relaxed) {
                tracing::error!(core = self.core_id, "stopping on fatal error signal");
                break;
            }
            if self.stop_flag.load(Ordering::Relaxed) && self.state == CoreState::Running {
                self.begin_stop();
            }

            let busy = self.tick();

            if self.exit_condition_met() {
                self.state = CoreState::Stopped;
                break;
            }

            if busy {
                idle_ticks = 0;
                continue;
            }

            idle_ticks += 1;
            if idle_ticks < self.config.idle_ticks_before_block {
                continue;
            }
            idle_ticks = 0;

            let timeout = self
                .reactor
                .next_wake()
                .map(|d| d.min(self.config.idle_backoff))
                .unwrap_or(self.config.idle_backoff);
            if let Ok(ready) = self.reactor.poll_ready(Some(timeout)) {
                self.dispatch_ready(ready);
            }
        }
    }

    fn exit_condition_met(&self) -> bool {
        let quiescent = self.actor_count == 0
            && self.callbacks.is_empty()
            && !self.reactor.has_pending()
            && !self.mailboxes.has_queued();
        match self.state {
            CoreState::Stopping => quiescent,
            CoreState::Running => quiescent,
            _ => false,
        }
    }

    /// Transition to `Stopping`: push a `KillEvent` to every actor assigned
    /// to this core so the normal dispatch loop tears them down on
    /// subsequent ticks, reusing the same path a handler-issued `kill()`
    /// would take.
    fn begin_stop(&mut self) {
        self.state = CoreState::Stopping;
        for target in self.roster.resolve(ActorId::broadcast_id(self.core_id)) {
            let alive = self.mailboxes.liveness().is_alive(target.service_id);
            let header = EventHeader {
                type_id: type_id_of::<KillEvent>(),
                source: target,
                destination: target,
                alive,
                is_live: false,
                size_bytes: std::mem::size_of::<KillEvent>() as u32,
            };
            self.mailboxes.push_local(Frame::new(header, KillEvent));
        }
    }

    fn flush_pending_ops(&mut self) {
        for op in std::mem::take(&mut self.pending_ops) {
            match op {
                PendingOp::RegisterThunk(type_id, actor, thunk) => {
                    self.registry.register(type_id, actor, thunk)
                }
                PendingOp::UnregisterThunk(type_id, actor) => {
                    self.registry.unregister(type_id, actor)
                }
                PendingOp::RegisterCallback(actor, thunk) => self.callbacks.register(actor, thunk),
                PendingOp::UnregisterCallback(actor) => self.callbacks.unregister(actor),
            }
        }
    }

    /// Mark `actor` dead immediately (new sends see it as dead right away)
    /// and queue it for removal from the registry/callback table. Removal
    /// is deferred so the actor still drains every event already queued
    /// for it this tick before it disappears (§4.5 `kill()` semantics).
    fn kill_now(&mut self, actor: ActorId) {
        self.mailboxes.liveness().mark_dead(actor.service_id);
        self.pending_kills.push(actor);
    }

    fn apply_pending_kills(&mut self) {
        if self.pending_kills.is_empty() {
            return;
        }
        for actor in std::mem::take(&mut self.pending_kills) {
            self.registry.remove_actor(actor);
            self.callbacks.remove_actor(actor);
            self.actor_count = self.actor_count.saturating_sub(1);
        }
        self.metrics
            .actors_alive
            .store(self.actor_count as u64, Ordering::Relaxed);
    }

    fn dispatch_one(&mut self, frame: Frame) {
        let destination = frame.header.destination;
        let mut registry = std::mem::take(&mut self.registry);
        let outcome = catch_unwind(AssertUnwindSafe(|| registry.dispatch(frame, self)));
        self.registry = registry;

        match outcome {
            Ok(DispatchOutcome::Dispatched) => {
                self.metrics.dispatched.fetch_add(1, Ordering::Relaxed);
            }
            Ok(DispatchOutcome::NoHandler) => {
                self.metrics
                    .dropped_no_handler
                    .fetch_add(1, Ordering::Relaxed);
            }
            Ok(DispatchOutcome::DeadDestination) => {
                self.metrics
                    .dropped_dead_destination
                    .fetch_add(1, Ordering::Relaxed);
                let err = CoreError::DeadDestination {
                    destination,
                };
                tracing::debug!(%err, "dropped frame");
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                self.metrics.handler_panics.fetch_add(1, Ordering::Relaxed);
                let err = CoreError::HandlerPanicked {
                    id: destination,
                    message,
                };
                tracing::error!(%err, "killing actor");
                self.kill_now(destination);
            }
        }
    }

    /// Run every actor's per-tick callback individually rather than
    /// through [`CallbackTable::run_all`], so one actor panicking does not
    /// skip the actors registered after it (§4.3 step 3).
    fn run_callbacks(&mut self) -> bool {
        let mut ran_any = false;
        for actor in self.callbacks.active_order() {
            let Some(mut thunk) = self.callbacks.take_thunk(actor) else {
                continue;
            };
            let result = catch_unwind(AssertUnwindSafe(|| thunk(self)));
            self.callbacks.put_thunk(actor, thunk);
            match result {
                Ok(()) => ran_any = true,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    self.metrics.handler_panics.fetch_add(1, Ordering::Relaxed);
                    let err = CoreError::HandlerPanicked { id: actor, message };
                    tracing::error!(%err, "killing actor");
                    self.kill_now(actor);
                }
            }
        }
        ran_any
    }

    /// Run due timers, then poll for I/O readiness and dispatch each ready
    /// source.
    ///
    /// Unlike dispatch/callbacks, this never needs `mem::take`: the reactor
    /// itself is never passed as the `core` argument, so `self.reactor` is
    /// simply a plain field that `schedule_after`/`arm_timer`/
    /// `insert_io_source`/`remove_io_source` can mutate directly, even
    /// re-entrantly from inside the callback this method is about to call.
    /// The one place that needs the same "move it out, call, put it back"
    /// trick as dispatch is the per-source callback itself, handled via
    /// [`crate::io::reactor::Reactor::swap_source`] rather than
    /// `mem::take`, since only one slot (not the whole table) needs to
    /// move.
    fn drive_reactor(&mut self) -> bool {
        let mut busy = false;
        for entry in self.reactor.due_timers() {
            busy = true;
            (entry.callback)(self);
        }
        match self.reactor.poll_ready(Some(Duration::ZERO)) {
            Ok(ready) => {
                if !ready.is_empty() {
                    busy = true;
                }
                self.dispatch_ready(ready);
            }
            Err(err) => tracing::warn!(core = self.core_id, %err, "reactor poll failed"),
        }
        busy
    }

    fn dispatch_ready(&mut self, ready: Vec<(Token, Readiness)>) {
        for (token, readiness) in ready {
            let placeholder: IoSourceFn = Box::new(|_: Readiness, _: &mut dyn CoreOps| {});
            if let Some(mut callback) = self.reactor.swap_source(token, placeholder) {
                callback(readiness, self);
                // Dropped silently if the callback removed its own source
                // (e.g. on disconnect) — see `Reactor::swap_source`.
                self.reactor.swap_source(token, callback);
            }
        }
    }
}

impl CoreOps for VirtualCore {
    fn core_id(&self) -> u16 {
        self.core_id
    }

    fn is_alive(&self, actor: ActorId) -> bool {
        if actor.core_id == self.core_id {
            self.mailboxes.liveness().is_alive(actor.service_id)
        } else {
            self.mailboxes.is_peer_alive(actor.core_id, actor.service_id)
        }
    }

    fn broadcast_targets(&self, pattern: ActorId) -> Vec<ActorId> {
        self.roster.resolve(pattern)
    }

    fn enqueue(&mut self, destination: ActorId, frame: Frame) {
        if destination.core_id == self.core_id {
            self.mailboxes.push_local(frame);
            return;
        }
        match self
            .mailboxes
            .push_remote(destination.core_id, frame, &self.stop_flag, self.config.max_spins)
        {
            Ok(spins) => {
                if spins > 0 {
                    self.metrics
                        .backpressure_spins
                        .fetch_add(spins as u64, Ordering::Relaxed);
                }
            }
            Err(MailboxError::Closed { core_id }) => {
                self.metrics
                    .dropped_engine_stopped
                    .fetch_add(1, Ordering::Relaxed);
                let err = CoreError::EngineStopped { core_id };
                tracing::debug!(%err, "dropped frame");
            }
            Err(MailboxError::Full { core_id }) => {
                self.metrics
                    .backpressure_spins
                    .fetch_add(self.config.max_spins as u64, Ordering::Relaxed);
                let err = CoreError::Backpressure { core_id };
                tracing::error!(%err, %destination, "dropped frame, mailbox stayed full for the whole spin budget");
            }
        }
    }

    fn register_thunk(&mut self, type_id: u32, actor: ActorId, thunk: Thunk) {
        self.pending_ops
            .push(PendingOp::RegisterThunk(type_id, actor, thunk));
    }

    fn unregister_thunk(&mut self, type_id: u32, actor: ActorId) {
        self.pending_ops
            .push(PendingOp::UnregisterThunk(type_id, actor));
    }

    fn register_callback(&mut self, actor: ActorId, thunk: CallbackThunk) {
        self.pending_ops.push(PendingOp::RegisterCallback(actor, thunk));
    }

    fn unregister_callback(&mut self, actor: ActorId) {
        self.pending_ops.push(PendingOp::UnregisterCallback(actor));
    }

    fn kill(&mut self, actor: ActorId) {
        self.kill_now(actor);
    }

    fn schedule_after(&mut self, actor: ActorId, delay: Duration, callback: DeferredFn) {
        self.reactor.schedule_after(actor, delay, callback);
    }

    fn arm_timer(&mut self, actor: ActorId, interval: Option<Duration>) {
        self.reactor.arm_timer(actor, interval);
    }

    fn io_registry(&self) -> &mio::Registry {
        self.reactor.registry()
    }

    fn reserve_io_token(&self) -> Token {
        self.reactor.reserve_token()
    }

    fn insert_io_source(&mut self, callback: IoSourceFn) -> Token {
        self.reactor.insert_source(callback)
    }

    fn remove_io_source(&mut self, token: Token) {
        self.reactor.remove_source(token);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
