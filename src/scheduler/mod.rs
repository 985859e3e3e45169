//! The per-core scheduler: one cooperative, single-threaded event loop per
//! OS thread, driving dispatch, callbacks and the I/O reactor in a fixed
//! order every tick (§4.3, §4.5).

mod callback_table;
mod metrics;
mod roster;
mod virtual_core;

pub use callback_table::CallbackTable;
pub use metrics::{CoreMetrics, CoreMetricsSnapshot};
pub use roster::Roster;
pub use virtual_core::{CoreState, VirtualCore, VirtualCoreConfig};
