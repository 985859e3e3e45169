//! Inter-core mailbox topology: one bounded ring per ordered core pair, plus
//! a plain local queue for same-core sends (ยง4.3).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::event::Frame;

use super::error::MailboxError;
use super::liveness::{CoreLiveness, LivenessView};

/// One core's view of the fabric: its inbound ring from every other core,
/// its outbound ring to every other core, its local same-core queue, and
/// the liveness tables needed to stamp `alive` at enqueue time.
pub struct Mailboxes {
    core_id: u16,
    core_count: u16,
    inbound: Vec<Option<Arc<ArrayQueue<Frame>>>>,
    outbound: Vec<Option<Arc<ArrayQueue<Frame>>>>,
    local: VecDeque<Frame>,
    liveness: CoreLiveness,
    peer_liveness: Vec<Option<LivenessView>>,
    drain_cursor: usize,
    drain_budget_per_peer: usize,
}

impl Mailboxes {
    /// Build the full `core_count x core_count` fabric (minus the diagonal)
    /// and return one [`Mailboxes`] handle per core, indexed by `core_id`.
    pub fn build_fabric(
        core_count: u16,
        ring_capacity: usize,
        actors_per_core_capacity: usize,
        drain_budget_per_peer: usize,
    ) -> Vec<Mailboxes> {
        let n = core_count as usize;
        // rings[i][j] carries frames produced on core i, consumed on core j.
        let mut rings: Vec<Vec<Option<Arc<ArrayQueue<Frame>>>>> =
            (0..n).map(|_| (0..n).map(|_| None).collect()).collect();
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    rings[i][j] = Some(Arc::new(ArrayQueue::new(ring_capacity)));
                }
            }
        }
        let liveness_tables: Vec<CoreLiveness> = (0..n)
            .map(|_| CoreLiveness::with_capacity(actors_per_core_capacity))
            .collect();

        // Resolve every core's view of its peers' liveness tables before
        // `liveness_tables` is consumed by value below.
        let views_per_core: Vec<Vec<Option<LivenessView>>> = (0..n)
            .map(|c| {
                (0..n)
                    .map(|i| {
                        if i == c {
                            None
                        } else {
                            Some(liveness_tables[i].view())
                        }
                    })
                    .collect()
            })
            .collect();

        let mut views_per_core = views_per_core;
        liveness_tables
            .into_iter()
            .enumerate()
            .map(|(c, owned_liveness)| {
                let inbound = (0..n).map(|i| rings[i][c].clone()).collect();
                let outbound = (0..n).map(|j| rings[c][j].clone()).collect();
                let peer_liveness = std::mem::take(&mut views_per_core[c]);
                Mailboxes {
                    core_id: c as u16,
                    core_count,
                    inbound,
                    outbound,
                    local: VecDeque::new(),
                    liveness: owned_liveness,
                    peer_liveness,
                    drain_cursor: 0,
                    drain_budget_per_peer,
                }
            })
            .collect()
    }

    pub fn core_id(&self) -> u16 {
        self.core_id
    }

    pub fn liveness(&self) -> &CoreLiveness {
        &self.liveness
    }

    /// Whether `service_id` on the peer `core_id` is currently alive, from
    /// this core's (possibly stale) cached view. Broadcast destinations are
    /// always treated as alive; fan-out decides per-recipient liveness.
    pub fn is_peer_alive(&self, core_id: u16, service_id: u16) -> bool {
        self.peer_liveness
            .get(core_id as usize)
            .and_then(|view| view.as_ref())
            .is_some_and(|view| view.is_alive(service_id))
    }

    /// Whether any frame is currently sitting in the local queue or an
    /// inbound ring, used by the scheduler's natural-exit check (§4.5).
    pub fn has_queued(&self) -> bool {
        !self.local.is_empty()
            || self
                .inbound
                .iter()
                .flatten()
                .any(|ring| !ring.is_empty())
    }

    /// Enqueue `frame` for same-core delivery. Unbounded: self-sends never
    /// backpressure since they never cross a thread boundary.
    pub fn push_local(&mut self, frame: Frame) {
        self.local.push_back(frame);
    }

    /// Enqueue `frame` for delivery to `core_id`, spinning with a yield
    /// between attempts while `stopped` stays false. Returns
    /// [`MailboxError::Closed`] if shutdown was observed before the push
    /// landed, or `Full` if `max_spins` attempts all found the ring full.
    /// Returns the number of failed attempts (spins) observed before the
    /// push landed, for the caller to fold into its backpressure metric.
    pub fn push_remote(
        &self,
        core_id: u16,
        mut frame: Frame,
        stopped: &AtomicBool,
        max_spins: u32,
    ) -> Result<u32, MailboxError> {
        let Some(ring) = self.outbound.get(core_id as usize).and_then(|r| r.as_ref()) else {
            return Err(MailboxError::Closed { core_id });
        };
        for spins in 0..max_spins {
            if stopped.load(Ordering::Relaxed) {
                return Err(MailboxError::Closed { core_id });
            }
            match ring.push(frame) {
                Ok(()) => return Ok(spins),
                Err(returned) => {
                    frame = returned;
                    std::thread::yield_now();
                }
            }
        }
        Err(MailboxError::Full { core_id })
    }

    /// Drain the inbound ring of each peer core first, round-robin from a
    /// rotating cursor with at most `drain_budget_per_peer` frames popped
    /// per peer so one busy peer cannot starve the others (ยง4.3, resolved
    /// peer-rotation policy), then drain same-core sends.
    pub fn drain_into(&mut self, out: &mut Vec<Frame>) {
        let n = self.core_count as usize;
        if n > 1 {
            for step in 0..n {
                let peer = (self.drain_cursor + step) % n;
                if peer == self.core_id as usize {
                    continue;
                }
                if let Some(ring) = self.inbound.get(peer).and_then(|r| r.as_ref()) {
                    for _ in 0..self.drain_budget_per_peer {
                        match ring.pop() {
                            Some(frame) => out.push(frame),
                            None => break,
                        }
                    }
                }
            }
            self.drain_cursor = (self.drain_cursor + 1) % n;
        }

        out.extend(self.local.drain(..));
    }
}
