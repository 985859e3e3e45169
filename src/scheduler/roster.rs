//! Static per-core actor membership, fixed once [`crate::engine::Engine::start`]
//! assigns every factory to its core (§4.1 broadcast fan-out).

use std::sync::Arc;

use crate::id::ActorId;

/// `roster[core_id]` lists the `service_id`s assigned to that core.
/// Shared read-only by every [`super::VirtualCore`] so a producer can
/// resolve a broadcast pattern to concrete recipients without asking the
/// owning core.
#[derive(Debug, Clone)]
pub struct Roster {
    by_core: Arc<Vec<Vec<u16>>>,
}

impl Roster {
    pub fn new(by_core: Vec<Vec<u16>>) -> Self {
        Self {
            by_core: Arc::new(by_core),
        }
    }

    pub fn core_count(&self) -> u16 {
        self.by_core.len() as u16
    }

    /// Concrete actor ids addressed by `pattern` (§4.1). `pattern` need not
    /// itself be a broadcast id; in that case the single concrete id is
    /// returned, matching the non-broadcast caller through the same path.
    pub fn resolve(&self, pattern: ActorId) -> Vec<ActorId> {
        use crate::id::{BROADCAST_CORE, BROADCAST_SERVICE};

        match (pattern.service_id, pattern.core_id) {
            (BROADCAST_SERVICE, BROADCAST_CORE) => self
                .by_core
                .iter()
                .enumerate()
                .flat_map(|(core, services)| {
                    services
                        .iter()
                        .map(move |sid| ActorId::new(*sid, core as u16))
                })
                .collect(),
            (service_id, BROADCAST_CORE) => self
                .by_core
                .iter()
                .enumerate()
                .filter(|(_, services)| services.contains(&service_id))
                .map(|(core, _)| ActorId::new(service_id, core as u16))
                .collect(),
            (BROADCAST_SERVICE, core_id) => self
                .by_core
                .get(core_id as usize)
                .map(|services| {
                    services
                        .iter()
                        .map(|sid| ActorId::new(*sid, core_id))
                        .collect()
                })
                .unwrap_or_default(),
            (_, _) => vec![pattern],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![vec![1, 2], vec![1, 3]])
    }

    #[test]
    fn everywhere_pattern_returns_every_actor() {
        let r = roster();
        let mut ids = r.resolve(ActorId::broadcast_everywhere());
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ActorId::new(1, 0),
                ActorId::new(1, 1),
                ActorId::new(2, 0),
                ActorId::new(3, 1),
            ]
        );
    }

    #[test]
    fn all_cores_pattern_filters_by_service_id() {
        let r = roster();
        let mut ids = r.resolve(ActorId::broadcast_all_cores(1));
        ids.sort();
        assert_eq!(ids, vec![ActorId::new(1, 0), ActorId::new(1, 1)]);
    }

    #[test]
    fn core_pattern_returns_every_service_on_that_core() {
        let r = roster();
        let mut ids = r.resolve(ActorId::broadcast_id(1));
        ids.sort();
        assert_eq!(ids, vec![ActorId::new(1, 1), ActorId::new(3, 1)]);
    }

    #[test]
    fn non_broadcast_pattern_resolves_to_itself() {
        let r = roster();
        assert_eq!(r.resolve(ActorId::new(2, 0)), vec![ActorId::new(2, 0)]);
    }
}
