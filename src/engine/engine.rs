//! Process-wide entry point (§6.1).
//!
//! `Engine` owns nothing actor-shaped itself: it collects `add_actor`
//! registrations, then `start()` builds the mailbox fabric and roster once
//! and spawns one OS thread per `VirtualCore`, handing each its slice of the
//! fabric and the factories assigned to it. Everything after that is the
//! core's own cooperative loop; the engine's job is bring-up, the shared
//! stop flag, and collecting snapshots.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::actor::{Actor, Factory, Spawned};
use crate::error::CoreError;
use crate::id::ActorId;
use crate::mailbox::Mailboxes;
use crate::monitoring::MonitoringSnapshot;
use crate::scheduler::{CoreMetrics, CoreMetricsSnapshot, Roster, VirtualCore, VirtualCoreConfig};

use super::EngineConfig;

/// Sized to hold any `service_id` up to `u16::MAX`, since `add_actor` never
/// knows in advance how many actors a core will end up hosting.
const LIVENESS_CAPACITY: usize = u16::MAX as usize + 1;

struct Registration {
    id: ActorId,
    factory: Factory,
}

/// Process-wide handle to a running (or not-yet-started) actor runtime.
///
/// # Examples
///
/// ```rust
/// use vcore_rt::engine::Engine;
/// use vcore_rt::actor::{Actor, ActorContext};
///
/// struct Greeter;
/// impl Actor for Greeter {
///     fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
///         ctx.kill();
///         true
///     }
/// }
///
/// let engine = Engine::new();
/// engine.add_actor(0, Greeter).unwrap();
/// engine.start(true);
/// assert!(!engine.has_error());
/// ```
pub struct Engine {
    config: EngineConfig,
    pending: Mutex<Vec<Vec<Registration>>>,
    next_service_id: Mutex<Vec<u16>>,
    stop_flag: Arc<AtomicBool>,
    fatal: Arc<AtomicBool>,
    metrics: Mutex<Vec<Arc<CoreMetrics>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let core_count = config.core_count as usize;
        Self {
            pending: Mutex::new((0..core_count).map(|_| Vec::new()).collect()),
            next_service_id: Mutex::new(vec![1u16; core_count]),
            stop_flag: Arc::new(AtomicBool::new(false)),
            fatal: Arc::new(AtomicBool::new(false)),
            metrics: Mutex::new(Vec::new()),
            handles: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Register `actor` to run on `core_id`, assigning it the next free
    /// service id on that core. Service ids start at 1; 0 is reserved for
    /// "every actor on this core" (§4.1). Construction is deferred until
    /// `start()` spawns the owning core's thread.
    pub fn add_actor<A: Actor + Send + 'static>(
        &self,
        core_id: u16,
        actor: A,
    ) -> Result<ActorId, CoreError> {
        if core_id >= self.config.core_count {
            return Err(CoreError::InvalidCoreId {
                core_id,
                core_count: self.config.core_count,
            });
        }

        let mut next_ids = self.next_service_id.lock();
        let service_id = next_ids[core_id as usize];
        next_ids[core_id as usize] = service_id + 1;
        drop(next_ids);

        let id = ActorId::new(service_id, core_id);
        let factory: Factory = Box::new(move |id| Spawned::new(id, actor));
        self.pending.lock()[core_id as usize].push(Registration { id, factory });
        Ok(id)
    }

    /// Build the fabric and roster from everything registered so far, spawn
    /// one OS thread per core, and run each core's registered actors through
    /// `on_init`. Blocks until every core thread exits when `blocking` is
    /// true; otherwise returns immediately and the caller is expected to
    /// call `join()` later.
    pub fn start(&self, blocking: bool) {
        let core_count = self.config.core_count;
        let registrations = std::mem::replace(
            &mut *self.pending.lock(),
            (0..core_count as usize).map(|_| Vec::new()).collect(),
        );

        let roster = Roster::new(
            registrations
                .iter()
                .map(|regs| regs.iter().map(|r| r.id.service_id).collect())
                .collect(),
        );

        let fabric = Mailboxes::build_fabric(
            core_count,
            self.config.default_mailbox_capacity,
            LIVENESS_CAPACITY,
            self.config.drain_budget_per_peer,
        );

        let vc_config = VirtualCoreConfig {
            max_spins: self.config.max_spins,
            reactor_event_capacity: self.config.reactor_event_capacity,
            idle_backoff: self.config.reactor_poll_timeout,
            idle_ticks_before_block: self.config.idle_ticks_before_block,
        };

        let mut metrics = self.metrics.lock();
        let mut handles = self.handles.lock();
        metrics.clear();
        handles.clear();

        for (core_id, (mailboxes, regs)) in
            fabric.into_iter().zip(registrations.into_iter()).enumerate()
        {
            let core_id = core_id as u16;
            let core_metrics = CoreMetrics::new();
            metrics.push(Arc::clone(&core_metrics));

            let mut core = match VirtualCore::new(
                core_id,
                mailboxes,
                roster.clone(),
                core_metrics,
                Arc::clone(&self.stop_flag),
                Arc::clone(&self.fatal),
                vc_config,
            ) {
                Ok(core) => core,
                Err(err) => {
                    tracing::error!(core_id, %err, "failed to bring up reactor for core");
                    self.fatal.store(true, Ordering::Relaxed);
                    continue;
                }
            };

            for reg in regs {
                let spawned = (reg.factory)(reg.id);
                if let Err(err) = core.spawn(spawned) {
                    if err.is_fatal() {
                        self.fatal.store(true, Ordering::Relaxed);
                    }
                }
            }

            let spawn_result = std::thread::Builder::new()
                .name(format!("vcore-{core_id}"))
                .spawn(move || core.run());
            match spawn_result {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    tracing::error!(core_id, %err, "failed to spawn core thread");
                    self.fatal.store(true, Ordering::Relaxed);
                }
            }
        }
        drop(metrics);
        drop(handles);

        if blocking {
            self.join();
        }
    }

    /// Block until every running core thread has exited.
    pub fn join(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Ask every core to stop cooperatively (§4.5): each core observes this
    /// at the top of its next iteration, enqueues a synthetic `KillEvent` to
    /// every local actor, and exits once it reaches natural quiescence.
    ///
    /// An ordinary instance method rather than a true process-wide static:
    /// a real global would need `unsafe` singleton state for no benefit,
    /// since every caller already holds (or can trivially share) the
    /// `Engine` handle that `start()` returned.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Whether any core has recorded a fatal error (§7): actor init failure,
    /// a panicking handler, an out-of-range core id, or a reactor that
    /// failed to come up at all.
    pub fn has_error(&self) -> bool {
        self.fatal.load(Ordering::Relaxed)
    }

    /// One snapshot per core, taken from its live atomic counters.
    pub fn snapshot(&self) -> Vec<MonitoringSnapshot> {
        self.metrics
            .lock()
            .iter()
            .enumerate()
            .map(|(core_id, metrics)| {
                MonitoringSnapshot::new(
                    core_id as u16,
                    CoreMetricsSnapshot::from(metrics.as_ref()),
                    Uuid::new_v4(),
                    Utc::now(),
                )
            })
            .collect()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorContext;

    struct SelfDestruct;
    impl Actor for SelfDestruct {
        fn on_init(&mut self, ctx: &mut ActorContext<'_, Self>) -> bool {
            ctx.kill();
            true
        }
    }

    #[test]
    fn add_actor_rejects_out_of_range_core_id() {
        let engine = Engine::with_config(EngineConfig::builder().with_core_count(1).build().unwrap());
        let err = engine.add_actor(5, SelfDestruct).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidCoreId {
                core_id: 5,
                core_count: 1
            }
        ));
    }

    #[test]
    fn add_actor_assigns_service_ids_starting_at_one() {
        let engine = Engine::with_config(EngineConfig::builder().with_core_count(1).build().unwrap());
        let first = engine.add_actor(0, SelfDestruct).unwrap();
        let second = engine.add_actor(0, SelfDestruct).unwrap();
        assert_eq!(first, ActorId::new(1, 0));
        assert_eq!(second, ActorId::new(2, 0));
    }

    #[test]
    fn engine_quiesces_once_every_actor_kills_itself() {
        let engine = Engine::with_config(EngineConfig::builder().with_core_count(1).build().unwrap());
        engine.add_actor(0, SelfDestruct).unwrap();
        engine.start(true);
        assert!(!engine.has_error());
        let snapshots = engine.snapshot();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].actor_count, 0);
    }

    #[test]
    fn stop_is_observed_by_a_core_with_no_actors() {
        let engine = Engine::with_config(EngineConfig::builder().with_core_count(1).build().unwrap());
        engine.start(false);
        engine.stop();
        engine.join();
        assert!(!engine.has_error());
    }
}
