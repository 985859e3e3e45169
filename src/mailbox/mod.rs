//! Inter-core and intra-core event transport (ยง4.3).
//!
//! Each [`crate::scheduler::VirtualCore`] owns one [`Mailboxes`] handle from
//! the fabric [`Mailboxes::build_fabric`] constructs: a bounded ring to and
//! from every other core, a plain queue for same-core sends, and a
//! [`liveness::CoreLiveness`] table the scheduler updates as actors start
//! and die.

mod error;
mod fabric;
mod liveness;

pub use error::MailboxError;
pub use fabric::Mailboxes;
pub use liveness::{CoreLiveness, LivenessView};
