//! Per-core I/O reactor: timers, readiness-driven callbacks, and deferred
//! (zero-or-positive-delay) callbacks folded into the same loop that drains
//! actor mailboxes (§4.6).
//!
//! Registered sources are dense-indexed in a [`Slab`] keyed by the `mio`
//! [`Token`] used to register them with the shared [`Poll`]; each slot owns
//! a closure invoked with the readiness event and a handle back into the
//! owning core, so a transport (`tcp`/`udp`/`ssl`) can push pseudo-events
//! (disconnected, timer, etc.) the same way an actor handler would.
//!
//! `Reactor` itself never holds a `&mut dyn CoreOps` across a call into its
//! own fields: the source/timer tables are always reachable directly so a
//! callback can register a new source or timer without re-entering a
//! method that's already borrowing them. The actual "run due timers, run
//! ready sources" loop lives in [`crate::scheduler::VirtualCore::tick`],
//! which is the only place that legitimately holds both `&mut Reactor`
//! (through `self.reactor`) and `&mut dyn CoreOps` (`self` itself) —
//! splitting the work this way keeps that one aliasing-prone call site the
//! only one that has to reason about it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use mio::{Events, Poll, Token};
use slab::Slab;

use crate::event::{DeferredFn, IoSourceFn, Readiness};
use crate::id::ActorId;

pub(crate) struct TimerEntry {
    fire_at: Instant,
    #[allow(dead_code)]
    owner: ActorId,
    seq: u64,
    pub(crate) callback: DeferredFn,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}
impl Eq for TimerEntry {}
impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // BinaryHeap is a max-heap; invert so the earliest deadline sorts first.
        (Reverse(self.fire_at), Reverse(self.seq)).cmp(&(Reverse(other.fire_at), Reverse(other.seq)))
    }
}

/// One core's I/O reactor. Owned exclusively by its [`crate::scheduler::VirtualCore`].
pub struct Reactor {
    poll: Poll,
    events: Events,
    sources: Slab<IoSourceFn>,
    timers: BinaryHeap<TimerEntry>,
    timer_seq: u64,
    /// Remembers the interval `with_timeout` last armed for an actor, so
    /// `update_timeout()` with no argument can re-arm identically.
    last_interval: std::collections::HashMap<ActorId, Duration>,
}

impl Reactor {
    pub fn new(event_capacity: usize) -> std::io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(event_capacity),
            sources: Slab::new(),
            timers: BinaryHeap::new(),
            timer_seq: 0,
            last_interval: std::collections::HashMap::new(),
        })
    }

    pub fn registry(&self) -> &mio::Registry {
        self.poll.registry()
    }

    /// Reserve a slot for a readiness-driven source and return the [`Token`]
    /// to register it under with [`Reactor::registry`].
    pub fn insert_source(&mut self, callback: IoSourceFn) -> Token {
        Token(self.sources.insert(callback))
    }

    /// Predict the token the next [`Reactor::insert_source`] call will
    /// return, without reserving it. Valid only if no other source is
    /// inserted/removed in between.
    pub fn reserve_token(&self) -> Token {
        Token(self.sources.vacant_key())
    }

    pub fn remove_source(&mut self, token: Token) {
        if self.sources.contains(token.0) {
            self.sources.remove(token.0);
        }
    }

    /// Swap the callback installed at `token` for `new`, returning the one
    /// that was there. Used by the drive loop to take a callback out before
    /// calling it (so the callback may freely touch the reactor again) and
    /// put it back afterward. Returns `None` if `token` was removed by the
    /// callback itself while it ran.
    pub(crate) fn swap_source(&mut self, token: Token, new: IoSourceFn) -> Option<IoSourceFn> {
        self.sources
            .get_mut(token.0)
            .map(|slot| std::mem::replace(slot, new))
    }

    /// Schedule `callback` to run on this core after `delay`, owned by
    /// `owner` purely for bookkeeping (cancellation is not part of the
    /// contract — see spec §5 "no implicit cancellation of in-flight
    /// operations").
    pub fn schedule_after(&mut self, owner: ActorId, delay: Duration, callback: DeferredFn) {
        let seq = self.timer_seq;
        self.timer_seq += 1;
        self.timers.push(TimerEntry {
            fire_at: Instant::now() + delay,
            owner,
            seq,
            callback,
        });
    }

    /// Record (or recall) the interval `with_timeout` uses for `actor`, and
    /// arm a one-shot `TimerEvent` delivery after it elapses.
    pub fn arm_timer(&mut self, actor: ActorId, interval: Option<Duration>) {
        let interval = match interval {
            Some(d) => {
                self.last_interval.insert(actor, d);
                d
            }
            None => self
                .last_interval
                .get(&actor)
                .copied()
                .unwrap_or(Duration::from_secs(0)),
        };
        let seq = self.timer_seq;
        self.timer_seq += 1;
        self.timers.push(TimerEntry {
            fire_at: Instant::now() + interval,
            owner: actor,
            seq,
            callback: Box::new(move |core| {
                super::timer::deliver(core, actor);
            }),
        });
    }

    /// Pop every timer entry whose deadline has passed, earliest first.
    /// Returns owned entries so the caller can invoke their callbacks
    /// without holding a borrow of `self`.
    pub(crate) fn due_timers(&mut self) -> Vec<TimerEntry> {
        let now = Instant::now();
        let mut due = Vec::new();
        while let Some(top) = self.timers.peek() {
            if top.fire_at > now {
                break;
            }
            if let Some(entry) = self.timers.pop() {
                due.push(entry);
            }
        }
        due
    }

    /// Poll for I/O readiness with `timeout` (`Some(Duration::ZERO)` for a
    /// non-blocking pass), returning the ready tokens and their readiness
    /// bits. Does not invoke any source callback itself — see module docs.
    pub fn poll_ready(&mut self, timeout: Option<Duration>) -> std::io::Result<Vec<(Token, Readiness)>> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => return Ok(Vec::new()),
            Err(err) => return Err(err),
        }
        Ok(self
            .events
            .iter()
            .map(|e| {
                (
                    Token(e.token().0),
                    Readiness {
                        readable: e.is_readable(),
                        writable: e.is_writable(),
                        error: e.is_error(),
                    },
                )
            })
            .collect())
    }

    /// Whether the reactor has anything outstanding that should keep the
    /// owning core's `Running` state alive (§4.5's exit condition).
    pub fn has_pending(&self) -> bool {
        !self.sources.is_empty() || !self.timers.is_empty()
    }

    /// How long the core may safely block (§4.3 step 5): the shortest
    /// outstanding timer, or `None` if there is none and the caller should
    /// fall back to blocking on readiness alone.
    pub fn next_wake(&self) -> Option<Duration> {
        self.timers
            .peek()
            .map(|entry| entry.fire_at.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_callback_is_due_immediately() {
        let mut reactor = Reactor::new(16).expect("poll available in test sandbox");
        let ran = std::rc::Rc::new(std::cell::Cell::new(false));
        let ran_clone = ran.clone();
        reactor.schedule_after(
            ActorId::new(1, 0),
            Duration::ZERO,
            Box::new(move |_core| ran_clone.set(true)),
        );
        std::thread::sleep(Duration::from_millis(1));
        let due = reactor.due_timers();
        assert_eq!(due.len(), 1);
        assert!(!ran.get());
    }

    #[test]
    fn has_pending_reflects_outstanding_timers() {
        let mut reactor = Reactor::new(16).expect("poll available in test sandbox");
        assert!(!reactor.has_pending());
        reactor.schedule_after(ActorId::new(1, 0), Duration::from_secs(60), Box::new(|_| {}));
        assert!(reactor.has_pending());
    }

    #[test]
    fn poll_ready_returns_empty_with_no_sources() {
        let mut reactor = Reactor::new(16).expect("poll available in test sandbox");
        let ready = reactor.poll_ready(Some(Duration::ZERO)).expect("poll");
        assert!(ready.is_empty());
    }
}
