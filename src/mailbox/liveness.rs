//! Cross-core liveness table.
//!
//! Each [`crate::scheduler::VirtualCore`] owns one [`CoreLiveness`] table,
//! densely indexed by the `service_id` the engine assigned each actor on
//! that core at `add_actor()` time. A remote producer holds a read-only
//! [`LivenessView`] (a clone of the same `Arc`) and consults it with a
//! relaxed load before enqueueing, so a frame's header can carry the
//! correct `alive` bit without the producer ever talking to the consumer
//! core (ยง4.3's "mailbox marks the frame's alive = false at enqueue").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owning side: written only by the core whose actors it tracks.
pub struct CoreLiveness {
    flags: Arc<[AtomicBool]>,
}

impl CoreLiveness {
    /// Build a table sized for up to `capacity` actors on this core.
    pub fn with_capacity(capacity: usize) -> Self {
        let flags: Vec<AtomicBool> = (0..capacity).map(|_| AtomicBool::new(false)).collect();
        Self {
            flags: flags.into(),
        }
    }

    pub fn mark_alive(&self, service_id: u16) {
        if let Some(flag) = self.flags.get(service_id as usize) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    pub fn mark_dead(&self, service_id: u16) {
        if let Some(flag) = self.flags.get(service_id as usize) {
            flag.store(false, Ordering::Relaxed);
        }
    }

    pub fn is_alive(&self, service_id: u16) -> bool {
        self.flags
            .get(service_id as usize)
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// A read-only, cheaply cloned view for remote producer cores.
    pub fn view(&self) -> LivenessView {
        LivenessView {
            flags: Arc::clone(&self.flags),
        }
    }
}

/// Read-only side, held by every other core's producer path.
#[derive(Clone)]
pub struct LivenessView {
    flags: Arc<[AtomicBool]>,
}

impl LivenessView {
    pub fn is_alive(&self, service_id: u16) -> bool {
        self.flags
            .get(service_id as usize)
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_reports_nothing_alive() {
        let liveness = CoreLiveness::with_capacity(4);
        assert!(!liveness.is_alive(0));
    }

    #[test]
    fn marking_alive_is_visible_through_a_view() {
        let liveness = CoreLiveness::with_capacity(4);
        let view = liveness.view();
        liveness.mark_alive(2);
        assert!(view.is_alive(2));
        assert!(!view.is_alive(1));
    }

    #[test]
    fn marking_dead_clears_the_flag() {
        let liveness = CoreLiveness::with_capacity(2);
        liveness.mark_alive(0);
        liveness.mark_dead(0);
        assert!(!liveness.is_alive(0));
    }

    #[test]
    fn out_of_range_service_id_is_never_alive() {
        let liveness = CoreLiveness::with_capacity(2);
        assert!(!liveness.is_alive(99));
    }
}
