//! Process-wide entry point (§6.1): builds the mailbox fabric and roster,
//! spawns one OS thread per VirtualCore, and hands back the handles needed
//! to add actors, observe counters, and stop the whole thing.

mod config;
#[allow(clippy::module_inception)]
mod engine;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::Engine;
