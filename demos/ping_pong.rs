//! Two actors on one core trade `Ping`/`Pong` three times, then tear
//! themselves down. Run with `cargo run --example ping_pong`.

use vcore_rt::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Ping(u32);
#[derive(Debug, Clone, Copy)]
struct Pong(u32);

struct PongActor;

impl Actor for PongActor {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        ctx.register_event::<Ping>();
        true
    }
}

impl Handler<Ping> for PongActor {
    fn on(&mut self, Ping(n): Ping, ctx: &mut ActorContext<'_, Self>) {
        println!("pong: received Ping({n})");
        ctx.reply(Pong(n));
        if n >= 3 {
            ctx.kill();
        }
    }
}

struct PingActor {
    target: ActorId,
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
        println!("ping: received Pong({n})");
        ctx.reply(Ping(n + 1));
        if n >= 3 {
            ctx.kill();
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let engine = Engine::new();
    let pong_id = match engine.add_actor(0, PongActor) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("failed to add pong actor: {e}");
            return;
        }
    };
    if let Err(e) = engine.add_actor(0, PingActor { target: pong_id }) {
        eprintln!("failed to add ping actor: {e}");
        return;
    }

    engine.start(true);
    assert!(!engine.has_error());
}
