//! # vcore-rt
//!
//! Multi-core actor runtime with an integrated non-blocking I/O reactor.
//!
//! One [`engine::Engine`] owns a fixed number of `VirtualCore`s, each pinned
//! to its own OS thread and driving a cooperative, single-threaded event
//! loop: no async/await, no preemption, no cross-core shared actor state.
//! Actors talk to each other and to the outside world exclusively through
//! [`actor::ActorContext`] — typed events dispatched by a per-core registry,
//! routed across cores through a fixed mailbox fabric, plus TCP/UDP/TLS/file
//! watch primitives folded into the same loop via [`io::Reactor`].
//!
//! ```rust
//! use vcore_rt::actor::{Actor, ActorContext};
//! use vcore_rt::engine::Engine;
//!
//! struct Greeter;
//! impl Actor for Greeter {
//!     fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
//!         ctx.kill();
//!         true
//!     }
//! }
//!
//! let engine = Engine::new();
//! engine.add_actor(0, Greeter).unwrap();
//! engine.start(true);
//! assert!(!engine.has_error());
//! ```
//!
//! # Module organization
//!
//! - [`actor`] — `Actor`/`Handler`/`ICallback` traits and `ActorContext`.
//! - [`engine`] — process-wide bring-up: `Engine`, `EngineConfig`.
//! - [`scheduler`] — `VirtualCore`'s cooperative drain-and-dispatch loop.
//! - [`event`] — typed event headers, dispatch registry, `CoreOps`.
//! - [`mailbox`] — inter-core ring fabric and liveness tracking.
//! - [`io`] — the reactor bridge: TCP/UDP/TLS/file-watch/timers.
//! - [`monitoring`] — per-core counter snapshots.
//! - [`error`] — `CoreError`, the crate-wide error taxonomy.
//! - [`id`] — `ActorId` addressing.

pub mod actor;
pub mod engine;
pub mod error;
pub mod event;
pub mod id;
pub mod io;
pub mod mailbox;
pub mod monitoring;
pub mod prelude;
pub mod scheduler;

pub use actor::{Actor, ActorContext, Handler, ICallback};
pub use engine::{Engine, EngineConfig, EngineConfigBuilder};
pub use error::CoreError;
pub use id::ActorId;
pub use monitoring::{InMemoryMonitor, Monitor, MonitoringSnapshot, NoopMonitor};
