//! Point-in-time copy of one core's counters (§4.8, §3.2 timestamp convention).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduler::CoreMetricsSnapshot;

/// One core's counters at the moment [`crate::engine::Engine::snapshot`] was
/// called, stamped with a unique id and wall-clock time so callers can
/// correlate snapshots taken across an observation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSnapshot {
    pub snapshot_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub core_id: u16,
    pub actor_count: u64,
    pub dispatched: u64,
    pub dropped_no_handler: u64,
    pub dropped_dead_destination: u64,
    pub dropped_engine_stopped: u64,
    pub init_failed: u64,
    pub handler_panics: u64,
    pub backpressure_spins: u64,
    pub ticks: u64,
}

impl MonitoringSnapshot {
    pub fn new(core_id: u16, metrics: CoreMetricsSnapshot, snapshot_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            snapshot_id,
            timestamp,
            core_id,
            actor_count: metrics.actors_alive,
            dispatched: metrics.dispatched,
            dropped_no_handler: metrics.dropped_no_handler,
            dropped_dead_destination: metrics.dropped_dead_destination,
            dropped_engine_stopped: metrics.dropped_engine_stopped,
            init_failed: metrics.init_failed,
            handler_panics: metrics.handler_panics,
            backpressure_spins: metrics.backpressure_spins,
            ticks: metrics.ticks,
        }
    }
}
