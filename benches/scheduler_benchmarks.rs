//! VirtualCore scheduling overhead independent of any dispatched event:
//! the cost of one empty tick, and of bringing up a batch of actors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use vcore_rt::actor::{Actor, ActorContext, Spawned};
use vcore_rt::id::ActorId;
use vcore_rt::mailbox::Mailboxes;
use vcore_rt::scheduler::{CoreMetrics, Roster, VirtualCore, VirtualCoreConfig};

struct Idle;
impl Actor for Idle {
    fn on_init(&mut self, _ctx: &mut ActorContext<'_, Self>) -> bool {
        true
    }
}

fn empty_core() -> VirtualCore {
    let mut fabric = Mailboxes::build_fabric(1, 8, 4, 4);
    let mailboxes = fabric.remove(0);
    let roster = Roster::new(vec![Vec::new()]);
    VirtualCore::new(
        0,
        mailboxes,
        roster,
        CoreMetrics::new(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(AtomicBool::new(false)),
        VirtualCoreConfig::default(),
    )
    .expect("reactor available in bench sandbox")
}

fn idle_tick_overhead(c: &mut Criterion) {
    c.bench_function("idle_tick_overhead", |b| {
        b.iter_batched(empty_core, |mut core| black_box(core.tick()), BatchSize::SmallInput);
    });
}

fn spawn_100_actors(c: &mut Criterion) {
    c.bench_function("spawn_100_actors", |b| {
        b.iter_batched(
            empty_core,
            |mut core| {
                for i in 1..=100u16 {
                    core.spawn(Spawned::new(ActorId::new(i, 0), Idle)).unwrap();
                }
                black_box(core.actor_count());
            },
            BatchSize::SmallInput,
        );
    });
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(2))
        .without_plots()
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = idle_tick_overhead, spawn_100_actors
}

criterion_main!(benches);
