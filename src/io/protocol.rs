//! Stream framing contract (§3.1 "Protocol state (I/O)", §4.6).
//!
//! A [`Protocol`] turns a byte stream into discrete messages with exact
//! consumption: `message_size()` answers "is a full message buffered, and
//! how big is it", and `on_message(size)` is called once the transport has
//! guaranteed those bytes are contiguous at the head of the input buffer.
//! Grounded on `original_source/io/example6_custom_protocol.cpp`'s
//! `getMessageSize`/`onMessage`/`reset` contract.

/// Append-only window a transport fills from the socket; a protocol reads
/// from the front and the transport consumes exactly what `on_message`
/// reported.
#[derive(Debug, Default)]
pub struct InputBuffer {
    bytes: Vec<u8>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Drop the first `size` bytes (§8 "Protocol consume exactness").
    pub fn consume(&mut self, size: usize) {
        self.bytes.drain(..size.min(self.bytes.len()));
    }
}

/// Write-ordered byte pipe a protocol assembles outbound frames into. The
/// transport drains it in FIFO order when the socket is writable; back
/// pressure is left entirely to the application (§4.6).
#[derive(Debug, Default)]
pub struct OutputPipe {
    bytes: Vec<u8>,
}

impl OutputPipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    pub fn pending(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Drop the first `n` bytes once the transport has written them.
    pub fn advance(&mut self, n: usize) {
        self.bytes.drain(..n.min(self.bytes.len()));
    }

    /// Discard everything, called when a connection disconnects (§4.6).
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// Per-connection framing state, implemented by application code and
/// attached to a transport (§3.1, §4.6).
pub trait Protocol {
    /// `0` if no complete message is buffered yet; otherwise the exact
    /// byte count of the next message. MUST NOT change its answer between
    /// this call and the matching `on_message` call (§4.6).
    fn message_size(&mut self, input: &InputBuffer) -> usize;

    /// Called once `size` (the value just returned from `message_size`)
    /// bytes are contiguous at the head of `input`. The caller consumes
    /// exactly `size` bytes from `input` immediately after this returns.
    fn on_message(&mut self, input: &InputBuffer, size: usize, output: &mut OutputPipe);

    /// Reset parser state, e.g. after a protocol switch (§4.6, §9 Open
    /// Questions: buffered bytes are re-parsed by the new protocol, so
    /// `reset` only clears parser state, never the shared input buffer).
    fn reset(&mut self) {}

    /// Checked whenever `message_size` reports `0`: whether the bytes
    /// buffered so far can never become a valid message (a bad header
    /// magic/version, an over-limit declared length, ...) rather than
    /// simply being incomplete. Default: never malformed, i.e. always wait
    /// for more bytes.
    fn is_malformed(&mut self, _input: &InputBuffer) -> bool {
        false
    }
}

/// Drive `protocol` over everything currently buffered in `input`,
/// consuming exactly what each `on_message` call reported (§4.6's inbound
/// contract). Shared by every transport so the exact-consumption rule is
/// implemented once.
///
/// Returns `Err` the first time `is_malformed` reports true on the
/// remaining bytes (§4.7 "protocol parse error") — the caller is expected
/// to emit a disconnected pseudo-event, close the connection and discard
/// the output pipe.
pub fn pump(protocol: &mut dyn Protocol, input: &mut InputBuffer, output: &mut OutputPipe) -> Result<(), String> {
    loop {
        let size = protocol.message_size(input);
        if size == 0 {
            if protocol.is_malformed(input) {
                return Err("protocol reported an unrecoverable framing error".to_string());
            }
            break;
        }
        protocol.on_message(input, size, output);
        input.consume(size);
    }
    Ok(())
}
