//! The I/O reactor bridge (§4.6): non-blocking TCP/UDP/SSL/file-watch
//! primitives folded into the same per-core loop that dispatches actor
//! events, plus the `Protocol` stream-framing contract every transport
//! shares.

mod callback;
mod file_watch;
mod protocol;
pub(crate) mod reactor;
mod ssl;
mod tcp;
mod timer;
mod udp;

pub use file_watch::{FileEvent, FileEventKind};
pub use protocol::{pump, InputBuffer, OutputPipe, Protocol};
pub use reactor::Reactor;
pub use ssl::{load_certs, load_private_key, TlsRole};
pub use tcp::DisconnectReason;
pub use timer::{TimerEvent, WithTimeout};
pub use udp::UdpHandle;

// `listen`/`connect`/`bind`/`listen_tls`/`connect_tls`/`watch` all take
// `&mut dyn CoreOps` directly and are not re-exported: actor code reaches
// them through the `ActorContext::tcp_listen`/`tcp_connect`/`udp_bind`/
// `listen_tls`/`connect_tls`/`watch_path` wrappers defined alongside each,
// which are the only things that can construct a `CoreOps` reference.
