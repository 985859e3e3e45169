//! Actor identity and addressing.
//!
//! An [`ActorId`] is a compact value type, not a globally unique handle: it
//! names a `(service_id, core_id)` pair and is only meaningful for the
//! lifetime of the actor it currently refers to. Two reserved values turn an
//! otherwise ordinary id into a broadcast address; see [`ActorId::is_broadcast`].

use std::fmt;

/// `service_id == 0` means "every actor on this core".
pub const BROADCAST_SERVICE: u16 = 0;

/// `core_id == BROADCAST_CORE` means "every core that has a matching service".
pub const BROADCAST_CORE: u16 = u16::MAX;

/// Identifies a single actor: the service slot it occupies plus the core it
/// is pinned to.
///
/// # Example
/// ```
/// use vcore_rt::id::ActorId;
///
/// let a = ActorId::new(3, 0);
/// let b = ActorId::new(3, 0);
/// assert_eq!(a, b);
/// assert_ne!(a, ActorId::new(3, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId {
    pub service_id: u16,
    pub core_id: u16,
}

impl ActorId {
    /// Construct an id for a concrete `(service_id, core_id)` pair.
    pub const fn new(service_id: u16, core_id: u16) -> Self {
        Self {
            service_id,
            core_id,
        }
    }

    /// Address every actor on `core_id`.
    pub const fn broadcast_id(core_id: u16) -> Self {
        Self::new(BROADCAST_SERVICE, core_id)
    }

    /// Address the service `service_id` on every core.
    pub const fn broadcast_all_cores(service_id: u16) -> Self {
        Self::new(service_id, BROADCAST_CORE)
    }

    /// Address every actor everywhere.
    pub const fn broadcast_everywhere() -> Self {
        Self::new(BROADCAST_SERVICE, BROADCAST_CORE)
    }

    /// True if this id requires fan-out rather than a single point-to-point
    /// delivery.
    pub const fn is_broadcast(&self) -> bool {
        self.service_id == BROADCAST_SERVICE || self.core_id == BROADCAST_CORE
    }

    /// True if this id, used as a destination, targets every actor on a
    /// single core (as opposed to a specific service across cores).
    pub const fn is_core_broadcast(&self) -> bool {
        self.service_id == BROADCAST_SERVICE && self.core_id != BROADCAST_CORE
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.core_id, self.service_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_fields_are_equal_ids() {
        assert_eq!(ActorId::new(1, 2), ActorId::new(1, 2));
    }

    #[test]
    fn different_core_differs() {
        assert_ne!(ActorId::new(1, 2), ActorId::new(1, 3));
    }

    #[test]
    fn broadcast_id_targets_core_with_reserved_service() {
        let id = ActorId::broadcast_id(5);
        assert_eq!(id.service_id, BROADCAST_SERVICE);
        assert_eq!(id.core_id, 5);
        assert!(id.is_broadcast());
        assert!(id.is_core_broadcast());
    }

    #[test]
    fn broadcast_all_cores_targets_service_with_reserved_core() {
        let id = ActorId::broadcast_all_cores(7);
        assert_eq!(id.service_id, 7);
        assert_eq!(id.core_id, BROADCAST_CORE);
        assert!(id.is_broadcast());
        assert!(!id.is_core_broadcast());
    }

    #[test]
    fn broadcast_everywhere_sets_both_reserved_fields() {
        let id = ActorId::broadcast_everywhere();
        assert!(id.is_broadcast());
        assert_eq!(id, ActorId::new(BROADCAST_SERVICE, BROADCAST_CORE));
    }

    #[test]
    fn ordinary_id_is_not_broadcast() {
        assert!(!ActorId::new(4, 1).is_broadcast());
    }

    #[test]
    fn display_format_is_core_colon_service() {
        assert_eq!(format!("{}", ActorId::new(9, 2)), "2:9");
    }
}
