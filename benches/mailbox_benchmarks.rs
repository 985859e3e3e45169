//! Mailbox fabric throughput: same-core queue/drain and cross-core
//! ring push, independent of any actor or scheduler overhead.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use vcore_rt::event::{EventHeader, Frame};
use vcore_rt::id::ActorId;
use vcore_rt::mailbox::Mailboxes;

fn frame(destination: ActorId) -> Frame {
    Frame::new(
        EventHeader {
            type_id: 0,
            source: ActorId::new(0, 0),
            destination,
            alive: true,
            is_live: false,
            size_bytes: 0,
        },
        0u32,
    )
}

fn push_local_and_drain_1000(c: &mut Criterion) {
    c.bench_function("push_local_and_drain_1000", |b| {
        b.iter_batched(
            || Mailboxes::build_fabric(1, 1024, 4, 64).remove(0),
            |mut core| {
                for _ in 0..1000 {
                    core.push_local(frame(ActorId::new(1, 0)));
                }
                let mut out = Vec::with_capacity(1000);
                core.drain_into(&mut out);
                black_box(out);
            },
            BatchSize::SmallInput,
        );
    });
}

fn push_remote_cross_core_1000(c: &mut Criterion) {
    c.bench_function("push_remote_cross_core_1000", |b| {
        b.iter_batched(
            || {
                let fabric = Mailboxes::build_fabric(2, 2048, 4, 64);
                (fabric, AtomicBool::new(false))
            },
            |(mut fabric, stopped)| {
                let core1 = fabric.remove(1);
                let core0 = fabric.remove(0);
                for _ in 0..1000 {
                    core0
                        .push_remote(1, frame(ActorId::new(1, 1)), &stopped, 1000)
                        .unwrap();
                }
                black_box(core1);
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
    targets = push_local_and_drain_1000, push_remote_cross_core_1000
}

criterion_main!(benches);
