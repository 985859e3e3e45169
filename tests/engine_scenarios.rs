//! End-to-end scenarios driven through the public `Engine` API, each one
//! running real actors across real OS threads. Grounded in the concrete
//! scenarios worked out for the scheduler and mailbox unit tests, scaled up
//! to the point a single `VirtualCore` can't exercise alone: cross-core
//! fan-out, broadcast membership, and self-send ordering.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use vcore_rt::actor::{Actor, ActorContext, Handler};
use vcore_rt::engine::{Engine, EngineConfig};
use vcore_rt::id::ActorId;

fn two_core_engine() -> Engine {
    Engine::with_config(EngineConfig::builder().with_core_count(2).build().unwrap())
}

#[derive(Debug, Clone, Copy)]
struct Ping(u32);
#[derive(Debug, Clone, Copy)]
struct Pong(u32);

struct PongActor {
    received: Arc<Mutex<Vec<u32>>>,
}

impl Actor for PongActor {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Ping>();
        true
    }
}

impl Handler<Ping> for PongActor {
    fn on(&mut self, Ping(n): Ping, ctx: &mut ActorContext<'_, Self>) {
        self.received.lock().unwrap().push(n);
        ctx.reply(Pong(n));
        if n >= 3 {
            ctx.kill();
        }
    }
}

struct PingActor {
    target: ActorId,
    received: Arc<Mutex<Vec<u32>>>,
}

impl Actor for PingActor {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Pong>();
        ctx.push(self.target, Ping(1));
        true
    }
}

impl Handler<Pong> for PingActor {
    fn on(&mut self, Pong(n): Pong, ctx: &mut ActorContext<'_, Self>) {
        self.received.lock().unwrap().push(n);
        ctx.reply(Ping(n + 1));
        if n >= 3 {
            ctx.kill();
        }
    }
}

/// Scenario 1: ping-pong on one core. B sees `Ping(1..=3)`, A sees
/// `Pong(1..=3)`, both actors kill themselves and the core quiesces.
#[test]
fn ping_pong_exchanges_exactly_three_rounds() {
    let engine = Engine::new();
    let pong_seen = Arc::new(Mutex::new(Vec::new()));
    let ping_seen = Arc::new(Mutex::new(Vec::new()));

    let pong_id = engine
        .add_actor(
            0,
            PongActor {
                received: Arc::clone(&pong_seen),
            },
        )
        .unwrap();
    engine
        .add_actor(
            0,
            PingActor {
                target: pong_id,
                received: Arc::clone(&ping_seen),
            },
        )
        .unwrap();

    engine.start(true);

    assert!(!engine.has_error());
    assert_eq!(&*pong_seen.lock().unwrap(), &[1, 2, 3]);
    assert_eq!(&*ping_seen.lock().unwrap(), &[1, 2, 3]);
}

#[derive(Debug, Clone, Copy)]
struct Work(u32);

struct Consumer {
    received: Arc<Mutex<Vec<u32>>>,
}

impl Actor for Consumer {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Work>();
        true
    }
}

impl Handler<Work> for Consumer {
    fn on(&mut self, Work(n): Work, ctx: &mut ActorContext<'_, Self>) {
        let mut seen = self.received.lock().unwrap();
        seen.push(n);
        if seen.len() == 1000 {
            ctx.kill();
        }
    }
}

struct Producer {
    target: ActorId,
}

impl Actor for Producer {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        for i in 0..1000u32 {
            ctx.push(self.target, Work(i));
        }
        ctx.kill();
        true
    }
}

/// Scenario 2: a producer on core 0 fans 1000 ordered `Work` events out to a
/// consumer pinned to core 1. The per-pair ring preserves FIFO order even
/// though delivery crosses a thread boundary.
#[test]
fn cross_core_fan_out_preserves_order() {
    let engine = two_core_engine();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let consumer_id = engine
        .add_actor(
            1,
            Consumer {
                received: Arc::clone(&seen),
            },
        )
        .unwrap();
    engine
        .add_actor(0, Producer { target: consumer_id })
        .unwrap();

    engine.start(true);

    assert!(!engine.has_error());
    let expected: Vec<u32> = (0..1000).collect();
    assert_eq!(&*seen.lock().unwrap(), &expected);
}

#[derive(Debug, Clone, Copy)]
struct Notify;

struct Worker {
    seen: Arc<Mutex<Vec<ActorId>>>,
}

impl Actor for Worker {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Notify>();
        true
    }
}

impl Handler<Notify> for Worker {
    fn on(&mut self, _event: Notify, ctx: &mut ActorContext<'_, Self>) {
        self.seen.lock().unwrap().push(ctx.id());
        ctx.kill();
    }
}

struct Dispatcher;

impl Actor for Dispatcher {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.broadcast(Notify);
        ctx.kill();
        true
    }
}

/// Scenario 3: broadcast to every actor on every core reaches each of the
/// three workers exactly once; the dispatcher (which never registered for
/// `Notify`) is not among the observers.
#[test]
fn broadcast_reaches_every_worker_exactly_once() {
    let engine = two_core_engine();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let w0 = engine
        .add_actor(
            0,
            Worker {
                seen: Arc::clone(&seen),
            },
        )
        .unwrap();
    let w1 = engine
        .add_actor(
            1,
            Worker {
                seen: Arc::clone(&seen),
            },
        )
        .unwrap();
    let w2 = engine
        .add_actor(
            1,
            Worker {
                seen: Arc::clone(&seen),
            },
        )
        .unwrap();
    engine.add_actor(0, Dispatcher).unwrap();

    engine.start(true);

    assert!(!engine.has_error());
    let mut observed = seen.lock().unwrap().clone();
    observed.sort();
    let mut expected = vec![w0, w1, w2];
    expected.sort();
    assert_eq!(observed, expected);
}

#[derive(Debug, Clone, Copy)]
struct Step(u32);

struct SelfSender {
    seen: Arc<Mutex<Vec<u32>>>,
}

impl Actor for SelfSender {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Step>();
        ctx.push(ctx.id(), Step(1));
        true
    }
}

impl Handler<Step> for SelfSender {
    fn on(&mut self, Step(n): Step, ctx: &mut ActorContext<'_, Self>) {
        self.seen.lock().unwrap().push(n);
        if n < 5 {
            ctx.push(ctx.id(), Step(n + 1));
        } else {
            ctx.kill();
        }
    }
}

/// Scenario 4: an actor that repeatedly sends to its own id sees each `Step`
/// exactly once, in order, with no re-entrant `on` call — a self-send is
/// deferred to the next dispatch step rather than invoked inline.
#[test]
fn self_send_is_deferred_and_strictly_ordered() {
    let engine = Engine::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    engine
        .add_actor(
            0,
            SelfSender {
                seen: Arc::clone(&seen),
            },
        )
        .unwrap();

    engine.start(true);

    assert!(!engine.has_error());
    assert_eq!(&*seen.lock().unwrap(), &[1, 2, 3, 4, 5]);
}

#[derive(Debug, Clone, Copy)]
struct Slow(u32);

struct SlowConsumer {
    remaining: u32,
}

impl Actor for SlowConsumer {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Slow>();
        true
    }
}

impl Handler<Slow> for SlowConsumer {
    fn on(&mut self, _event: Slow, ctx: &mut ActorContext<'_, Self>) {
        std::thread::sleep(Duration::from_millis(2));
        self.remaining -= 1;
        if self.remaining == 0 {
            ctx.kill();
        }
    }
}

struct BurstProducer {
    target: ActorId,
    count: u32,
}

impl Actor for BurstProducer {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        for i in 0..self.count {
            ctx.push(self.target, Slow(i));
        }
        ctx.kill();
        true
    }
}

/// Scenario 5: a producer blasts far more cross-core frames than a two-slot
/// ring can hold at a deliberately slow consumer, so some pushes exhaust the
/// cooperative spin budget before the consumer catches up. Every push still
/// either lands or is accounted for in `backpressure_spins` — none are
/// silently lost — and the engine keeps running to completion.
#[test]
fn bounded_mailbox_saturates_under_a_cross_core_burst() {
    let config = EngineConfig::builder()
        .with_core_count(2)
        .with_mailbox_capacity(2)
        .with_max_spins(4)
        .build()
        .unwrap();
    let engine = Engine::with_config(config);

    let consumer_id = engine
        .add_actor(1, SlowConsumer { remaining: 200 })
        .unwrap();
    engine
        .add_actor(
            0,
            BurstProducer {
                target: consumer_id,
                count: 200,
            },
        )
        .unwrap();

    engine.start(true);

    assert!(!engine.has_error());
    let producer_core = engine
        .snapshot()
        .into_iter()
        .find(|s| s.core_id == 0)
        .unwrap();
    assert!(
        producer_core.backpressure_spins > 0,
        "expected the burst to exhaust the spin budget at least once"
    );
}
