//! Process-wide configuration, mirroring the teacher's `SystemConfigBuilder`
//! shape (§3.1 EngineConfig).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of VirtualCores: one per logical CPU.
pub fn default_core_count() -> u16 {
    num_cpus::get() as u16
}

/// Default inter-core ring capacity in frames (power of two).
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

/// Default cap on frames drained from one peer ring before rotating.
pub const DEFAULT_DRAIN_BUDGET_PER_PEER: usize = 64;

/// Default consecutive-idle-tick threshold before a core blocks on reactor
/// readiness.
pub const DEFAULT_IDLE_TICKS_BEFORE_BLOCK: u32 = 16;

/// Default upper bound on one blocking reactor poll.
pub const DEFAULT_REACTOR_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Default cooperative-spin budget for a backpressured cross-core send.
pub const DEFAULT_MAX_SPINS: u32 = 1000;

/// Default `mio::Events` buffer size per reactor poll.
pub const DEFAULT_REACTOR_EVENT_CAPACITY: usize = 256;

/// Process-wide configuration for an [`crate::engine::Engine`] (§3.1).
///
/// # Examples
///
/// ```rust
/// use vcore_rt::engine::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .with_core_count(4)
///     .with_mailbox_capacity(2048)
///     .build()
///     .unwrap();
/// assert_eq!(config.core_count, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of VirtualCores to spawn; defaults to `num_cpus::get()`.
    pub core_count: u16,
    /// Capacity of each inter-core ring, in frames. Must be a power of two.
    pub default_mailbox_capacity: usize,
    /// Max frames drained from one peer's ring before rotating to the next.
    pub drain_budget_per_peer: usize,
    /// Consecutive idle ticks before a core blocks on reactor readiness.
    pub idle_ticks_before_block: u32,
    /// Upper bound on one blocking reactor poll.
    pub reactor_poll_timeout: Duration,
    /// Cooperative-spin budget for a backpressured cross-core send.
    pub max_spins: u32,
    /// `mio::Events` buffer size per reactor poll.
    pub reactor_event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            core_count: default_core_count(),
            default_mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            drain_budget_per_peer: DEFAULT_DRAIN_BUDGET_PER_PEER,
            idle_ticks_before_block: DEFAULT_IDLE_TICKS_BEFORE_BLOCK,
            reactor_poll_timeout: DEFAULT_REACTOR_POLL_TIMEOUT,
            max_spins: DEFAULT_MAX_SPINS,
            reactor_event_capacity: DEFAULT_REACTOR_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.core_count == 0 {
            return Err("core_count must be > 0".to_string());
        }
        if !self.default_mailbox_capacity.is_power_of_two() {
            return Err("default_mailbox_capacity must be a power of two".to_string());
        }
        if self.drain_budget_per_peer == 0 {
            return Err("drain_budget_per_peer must be > 0".to_string());
        }
        if self.idle_ticks_before_block == 0 {
            return Err("idle_ticks_before_block must be > 0".to_string());
        }
        if self.max_spins == 0 {
            return Err("max_spins must be > 0".to_string());
        }
        Ok(())
    }
}

/// Fluent builder for [`EngineConfig`], validated on [`EngineConfigBuilder::build`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn with_core_count(mut self, count: u16) -> Self {
        self.config.core_count = count;
        self
    }

    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.default_mailbox_capacity = capacity;
        self
    }

    pub fn with_drain_budget_per_peer(mut self, budget: usize) -> Self {
        self.config.drain_budget_per_peer = budget;
        self
    }

    pub fn with_idle_ticks_before_block(mut self, ticks: u32) -> Self {
        self.config.idle_ticks_before_block = ticks;
        self
    }

    pub fn with_reactor_poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.reactor_poll_timeout = timeout;
        self
    }

    pub fn with_max_spins(mut self, spins: u32) -> Self {
        self.config.max_spins = spins;
        self
    }

    pub fn build(self) -> Result<EngineConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn non_power_of_two_capacity_is_rejected() {
        let result = EngineConfig::builder().with_mailbox_capacity(1000).build();
        assert!(result.is_err());
    }

    #[test]
    fn zero_core_count_is_rejected() {
        let result = EngineConfig::builder().with_core_count(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_applies_every_option() {
        let config = EngineConfig::builder()
            .with_core_count(2)
            .with_mailbox_capacity(512)
            .with_drain_budget_per_peer(8)
            .with_idle_ticks_before_block(4)
            .with_reactor_poll_timeout(Duration::from_millis(10))
            .with_max_spins(100)
            .build()
            .unwrap();
        assert_eq!(config.core_count, 2);
        assert_eq!(config.default_mailbox_capacity, 512);
        assert_eq!(config.drain_budget_per_peer, 8);
        assert_eq!(config.idle_ticks_before_block, 4);
        assert_eq!(config.reactor_poll_timeout, Duration::from_millis(10));
        assert_eq!(config.max_spins, 100);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.core_count, restored.core_count);
        assert_eq!(
            config.default_mailbox_capacity,
            restored.default_mailbox_capacity
        );
    }
}
