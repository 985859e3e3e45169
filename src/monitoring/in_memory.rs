//! Bounded in-process history of snapshots, for tests and simple dashboards.

use parking_lot::Mutex;

use super::snapshot::MonitoringSnapshot;
use super::traits::Monitor;

/// Keeps the most recent `capacity` snapshots per call to `record`,
/// dropping the oldest once full.
pub struct InMemoryMonitor {
    capacity: usize,
    history: Mutex<Vec<MonitoringSnapshot>>,
}

impl InMemoryMonitor {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn history(&self) -> Vec<MonitoringSnapshot> {
        self.history.lock().clone()
    }
}

impl Monitor for InMemoryMonitor {
    fn record(&self, snapshot: MonitoringSnapshot) {
        let mut history = self.history.lock();
        history.push(snapshot);
        if history.len() > self.capacity {
            let overflow = history.len() - self.capacity;
            history.drain(0..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn snapshot(core_id: u16) -> MonitoringSnapshot {
        MonitoringSnapshot::new(core_id, Default::default(), Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn keeps_most_recent_snapshots_only() {
        let monitor = InMemoryMonitor::new(2);
        monitor.record(snapshot(0));
        monitor.record(snapshot(1));
        monitor.record(snapshot(2));
        let history = monitor.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].core_id, 1);
        assert_eq!(history[1].core_id, 2);
    }
}
