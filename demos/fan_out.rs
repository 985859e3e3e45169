//! A producer on core 0 fans 20 ordered `Work` events out to a consumer
//! pinned to core 1, across the inter-core mailbox fabric. Run with
//! `cargo run --example fan_out`.

use vcore_rt::engine::EngineConfig;
use vcore_rt::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Work(u32);

struct Consumer {
    received: u32,
}

impl Actor for Consumer {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Work>();
        true
    }
}

impl Handler<Work> for Consumer {
    fn on(&mut self, Work(n): Work, ctx: &mut ActorContext<'_, Self>) {
        self.received += 1;
        println!("consumer (core {}): Work({n})", ctx.core_id());
        if self.received == 20 {
            ctx.kill();
        }
    }
}

struct Producer {
    target: ActorId,
}

impl Actor for Producer {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        for i in 0..20u32 {
            ctx.push(self.target, Work(i));
        }
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

    let consumer_id = match engine.add_actor(1, Consumer { received: 0 }) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("failed to add consumer actor: {e}");
            return;
        }
    };
    if let Err(e) = engine.add_actor(0, Producer { target: consumer_id }) {
        eprintln!("failed to add producer actor: {e}");
        return;
    }

    engine.start(true);
    assert!(!engine.has_error());
}
