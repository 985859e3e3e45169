//! The handful of per-core atomic counters §7/§8 require to be externally
//! observable without touching actor state from another thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared between a [`super::VirtualCore`] (sole writer) and
/// [`crate::monitoring::MonitoringSnapshot`] (reader, any thread).
#[derive(Default)]
pub struct CoreMetrics {
    pub dispatched: AtomicU64,
    pub dropped_no_handler: AtomicU64,
    pub dropped_dead_destination: AtomicU64,
    pub dropped_engine_stopped: AtomicU64,
    pub init_failed: AtomicU64,
    pub handler_panics: AtomicU64,
    pub ticks: AtomicU64,
    pub backpressure_spins: AtomicU64,
    pub actors_alive: AtomicU64,
}

impl CoreMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

fn load(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

/// A point-in-time, read-only copy of one core's counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreMetricsSnapshot {
    pub dispatched: u64,
    pub dropped_no_handler: u64,
    pub dropped_dead_destination: u64,
    pub dropped_engine_stopped: u64,
    pub init_failed: u64,
    pub handler_panics: u64,
    pub ticks: u64,
    pub backpressure_spins: u64,
    pub actors_alive: u64,
}

impl From<&CoreMetrics> for CoreMetricsSnapshot {
    fn from(m: &CoreMetrics) -> Self {
        Self {
            dispatched: load(&m.dispatched),
            dropped_no_handler: load(&m.dropped_no_handler),
            dropped_dead_destination: load(&m.dropped_dead_destination),
            dropped_engine_stopped: load(&m.dropped_engine_stopped),
            init_failed: load(&m.init_failed),
            handler_panics: load(&m.handler_panics),
            ticks: load(&m.ticks),
            backpressure_spins: load(&m.backpressure_spins),
            actors_alive: load(&m.actors_alive),
        }
    }
}
