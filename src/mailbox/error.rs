//! Mailbox-fabric failure modes.

/// Failures a producer can observe when pushing a [`crate::event::Frame`]
/// into a peer core's inbound ring.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// The ring to `core_id` stayed full for the caller's retry budget.
    #[error("mailbox to core {core_id} is full")]
    Full { core_id: u16 },

    /// The engine is shutting down and stopped accepting sends to `core_id`.
    #[error("mailbox to core {core_id} is closed")]
    Closed { core_id: u16 },
}
