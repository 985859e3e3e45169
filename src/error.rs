//! Crate-wide error taxonomy.
//!
//! Mirrors ยง7 of the design spec: each failure kind the runtime can observe
//! gets one matchable variant. Errors are always local to the core that
//! observed them; the framework never propagates an error across an actor
//! boundary and never retries a failed send on the application's behalf.

use std::io;

use crate::id::ActorId;

/// Errors surfaced by the runtime to callers of [`crate::engine::Engine`] and
/// recorded in each core's [`crate::monitoring::MonitoringSnapshot`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// `on_init()` returned `false`; the actor was discarded before dispatch.
    #[error("actor {id} failed to initialize")]
    InitFailed { id: ActorId },

    /// A handler panicked; treated as an implicit `kill()` for that actor.
    #[error("actor {id} handler panicked: {message}")]
    HandlerPanicked { id: ActorId, message: String },

    /// An event was published to an id that is no longer live.
    #[error("event delivered to dead destination {destination}")]
    DeadDestination { destination: ActorId },

    /// A protocol reported an unrecoverable framing error on a connection.
    #[error("protocol error on connection {connection_id}: {reason}")]
    ProtocolError { connection_id: u64, reason: String },

    /// A read/write/accept syscall failed.
    #[error("io error on connection {connection_id}: {source}")]
    Io {
        connection_id: u64,
        #[source]
        source: io::Error,
    },

    /// An inter-core ring was full; recorded only when the producer gives up
    /// entirely (e.g. during engine shutdown), not on every cooperative spin.
    #[error("mailbox to core {core_id} is full and shutting down")]
    Backpressure { core_id: u16 },

    /// An event was dropped because its destination core had already
    /// stopped.
    #[error("destination core {core_id} has stopped")]
    EngineStopped { core_id: u16 },

    /// A core id passed to `Engine::add_actor` exceeds the configured core
    /// count.
    #[error("core id {core_id} is out of range (engine has {core_count} cores)")]
    InvalidCoreId { core_id: u16, core_count: u16 },
}

impl CoreError {
    /// Whether this error should flip `Engine::has_error()` to `true`.
    ///
    /// Only a required actor failing to initialize or an invalid engine
    /// configuration counts as fatal. A handler panic is treated as an
    /// implicit `kill()` for the one actor that panicked — the core keeps
    /// running and other actors are unaffected, so it is counted but never
    /// fatal; likewise dropped events, protocol errors and backpressure are
    /// expected, countable occurrences under normal operation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::InitFailed { .. } | CoreError::InvalidCoreId { .. }
        )
    }
}
