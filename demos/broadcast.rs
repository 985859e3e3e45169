//! A dispatcher on core 0 broadcasts one `Notify` to every actor on every
//! core; three workers split across two cores each see it exactly once.
//! Run with `cargo run --example broadcast`.

use vcore_rt::engine::EngineConfig;
use vcore_rt::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Notify(&'static str);

struct Worker;

impl Actor for Worker {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Notify>();
        true
    }
}

impl Handler<Notify> for Worker {
    fn on(&mut self, Notify(message): Notify, ctx: &mut ActorContext<'_, Self>) {
        println!("worker {} (core {}): {message}", ctx.id(), ctx.core_id());
        ctx.kill();
    }
}

struct Dispatcher;

impl Actor for Dispatcher {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.broadcast(Notify("rolling restart"));
        ctx.kill();
        true
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let config = match EngineConfig::builder().with_core_count(2).build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid engine config: {e}");
            return;
        }
    };
    let engine = Engine::with_config(config);

    for (core_id, label) in [(0, "worker 1"), (1, "worker 2"), (1, "worker 3")] {
        if let Err(e) = engine.add_actor(core_id, Worker) {
            eprintln!("failed to add {label}: {e}");
            return;
        }
    }
    if let Err(e) = engine.add_actor(0, Dispatcher) {
        eprintln!("failed to add dispatcher: {e}");
        return;
    }

    engine.start(true);
    assert!(!engine.has_error());
}
