//! Watches a scratch directory for roughly a second, printing every
//! create/modify/remove `notify` reports through the reactor's poll timer.
//! Run with `cargo run --example file_watch`.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tempfile::tempdir;

use vcore_rt::prelude::*;

struct Watcher {
    path: PathBuf,
}

impl Actor for Watcher {
    fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
        let started = ctx.watch_path(&self.path, Duration::from_millis(50), |_actor, _ctx, event| {
            println!("{:?} {}", event.kind, event.path.display());
        });
        if let Err(err) = started {
            eprintln!("failed to start watch: {err}");
            ctx.kill();
            return true;
        }
        ctx.schedule_after(Duration::from_millis(800), |_actor, ctx| {
            ctx.kill();
        });
        true
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let dir = match tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("failed to create scratch directory: {e}");
            return;
        }
    };
    let watch_path = dir.path().to_path_buf();

    let writer_path = watch_path.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        let file = writer_path.join("a.txt");
        let _ = std::fs::write(&file, b"hello");
        thread::sleep(Duration::from_millis(150));
        let _ = std::fs::write(&file, b"hello again");
        thread::sleep(Duration::from_millis(150));
        let _ = std::fs::remove_file(&file);
    });

    let engine = Engine::new();
    if let Err(e) = engine.add_actor(0, Watcher { path: watch_path }) {
        eprintln!("failed to add watcher actor: {e}");
        return;
    }

    engine.start(true);
    assert!(!engine.has_error());
}
