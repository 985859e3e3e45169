//! `Engine::snapshot` observed from outside, after actors have actually run
//! and torn themselves down. Per-field counter behavior is covered at the
//! unit level in `scheduler::metrics` and `monitoring::snapshot`; this
//! exercises the wiring between a finished engine and the snapshots it
//! hands back.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use vcore_rt::actor::{Actor, ActorContext, Handler};
use vcore_rt::engine::{Engine, EngineConfig};
use vcore_rt::monitoring::{InMemoryMonitor, Monitor};

#[derive(Debug, Clone, Copy)]
struct Tick;

struct Counter {
    handled: Arc<Mutex<u32>>,
}

impl Actor for Counter {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Tick>();
        ctx.push(ctx.id(), Tick);
        true
    }
}

impl Handler<Tick> for Counter {
    fn on(&mut self, _event: Tick, ctx: &mut ActorContext<'_, Self>) {
        let mut handled = self.handled.lock().unwrap();
        *handled += 1;
        if *handled >= 5 {
            ctx.kill();
        } else {
            ctx.push(ctx.id(), Tick);
        }
    }
}

#[test]
fn snapshot_reflects_dispatch_counts_after_actors_finish() {
    let engine = Engine::with_config(EngineConfig::builder().with_core_count(2).build().unwrap());
    let handled = Arc::new(Mutex::new(0));
    engine
        .add_actor(
            0,
            Counter {
                handled: Arc::clone(&handled),
            },
        )
        .unwrap();

    engine.start(true);

    let snapshots = engine.snapshot();
    assert_eq!(snapshots.len(), 2);

    let core0 = snapshots.iter().find(|s| s.core_id == 0).unwrap();
    assert_eq!(core0.dispatched, 5);
    assert_eq!(core0.actor_count, 0);

    let core1 = snapshots.iter().find(|s| s.core_id == 1).unwrap();
    assert_eq!(core1.dispatched, 0);
}

#[test]
fn snapshots_feed_into_a_monitor_unmodified() {
    let engine = Engine::new();
    let handled = Arc::new(Mutex::new(0));
    engine
        .add_actor(
            0,
            Counter {
                handled: Arc::clone(&handled),
            },
        )
        .unwrap();
    engine.start(true);

    let monitor = InMemoryMonitor::new(10);
    for snapshot in engine.snapshot() {
        monitor.record(snapshot);
    }

    let history = monitor.history();
    assert!(history.iter().any(|s| s.dispatched == 5));
}
