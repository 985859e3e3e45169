//! Zero-overhead monitor for production builds that don't want history kept.

use super::snapshot::MonitoringSnapshot;
use super::traits::Monitor;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl Monitor for NoopMonitor {
    fn record(&self, _snapshot: MonitoringSnapshot) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_a_no_op() {
        let monitor = NoopMonitor;
        monitor.record(MonitoringSnapshot::new(
            0,
            Default::default(),
            uuid::Uuid::nil(),
            chrono::Utc::now(),
        ));
    }
}
