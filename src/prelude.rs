//! Convenience re-exports for application code.
//!
//! ```rust
//! use vcore_rt::prelude::*;
//! ```

pub use crate::actor::{Actor, ActorContext, Handler, ICallback};
pub use crate::engine::{Engine, EngineConfig, EngineConfigBuilder};
pub use crate::error::CoreError;
pub use crate::id::ActorId;
pub use crate::io::{DisconnectReason, FileEvent, FileEventKind, TlsRole, UdpHandle};
pub use crate::monitoring::{InMemoryMonitor, Monitor, MonitoringSnapshot, NoopMonitor};
