//! VirtualCore dispatch throughput: spawn one actor, queue N `Ping` frames,
//! measure one `tick()` draining and dispatching all of them.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use vcore_rt::actor::{Actor, ActorContext, Handler, Spawned};
use vcore_rt::event::{type_id_of, CoreOps, EventHeader, Frame};
use vcore_rt::id::ActorId;
use vcore_rt::mailbox::Mailboxes;
use vcore_rt::scheduler::{CoreMetrics, Roster, VirtualCore, VirtualCoreConfig};

#[derive(Debug, Clone, Copy)]
struct Ping;

struct Echo {
    received: Rc<Cell<u64>>,
}

impl Actor for Echo {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Ping>();
        true
    }
}

impl Handler<Ping> for Echo {
    fn on(&mut self, _event: Ping, _ctx: &mut ActorContext<'_, Self>) {
        self.received.set(self.received.get() + 1);
    }
}

fn core_with_pending_pings(count: usize) -> VirtualCore {
    let mut fabric = Mailboxes::build_fabric(1, 8, 4, 4);
    let mailboxes = fabric.remove(0);
    let roster = Roster::new(vec![vec![1]]);
    let mut core = VirtualCore::new(
        0,
        mailboxes,
        roster,
        CoreMetrics::new(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(AtomicBool::new(false)),
        VirtualCoreConfig::default(),
    )
    .expect("reactor available in bench sandbox");

    let id = ActorId::new(1, 0);
    core.spawn(Spawned::new(
        id,
        Echo {
            received: Rc::new(Cell::new(0)),
        },
    ))
    .unwrap();

    for _ in 0..count {
        core.enqueue(
            id,
            Frame::new(
                EventHeader {
                    type_id: type_id_of::<Ping>(),
                    source: id,
                    destination: id,
                    alive: true,
                    is_live: false,
                    size_bytes: 0,
                },
                Ping,
            ),
        );
    }
    core
}

fn dispatch_one_event(c: &mut Criterion) {
    c.bench_function("dispatch_one_event", |b| {
        b.iter_batched(
            || core_with_pending_pings(1),
            |mut core| black_box(core.tick()),
            BatchSize::SmallInput,
        );
    });
}

fn dispatch_batch_of_1000(c: &mut Criterion) {
    c.bench_function("dispatch_batch_of_1000", |b| {
        b.iter_batched(
            || core_with_pending_pings(1000),
            |mut core| black_box(core.tick()),
            BatchSize::LargeInput,
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
    targets = dispatch_one_event, dispatch_batch_of_1000
}

criterion_main!(benches);
