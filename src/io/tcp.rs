//! TCP client/server primitives (§4.6), grounded on
//! `original_source/io/example3_tcp_networking.cpp`'s `TCPServer` /
//! `TCPClient` / `ServerClientHandler` shapes: a listener accepts
//! connections and attaches a fresh `Protocol` to each one; all reads,
//! writes and protocol callbacks for a connection stay on the core that
//! accepted it.

use std::io::{self, ErrorKind, Read, Write};
use std::net::SocketAddr;
use std::rc::Rc;

use mio::net::{TcpListener, TcpStream};
use mio::{Interest, Token};

use crate::actor::{Actor, ActorContext};
use crate::error::CoreError;
use crate::event::{CoreOps, IoSourceFn, Readiness};

use super::protocol::{pump, InputBuffer, OutputPipe, Protocol};

/// Why a connection's source was torn down, delivered to the protocol via
/// [`Protocol::reset`] having already run and the transport then dropping
/// the socket — §4.6 "transport emits a disconnected pseudo-event".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer closed its write half (a zero-length read).
    Eof,
    /// A read or write syscall failed.
    Error(ErrorKind),
}

struct Connection<P: Protocol> {
    stream: TcpStream,
    protocol: P,
    input: InputBuffer,
    output: OutputPipe,
    on_disconnect: Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason)>,
}

impl<P: Protocol> Connection<P> {
    /// Drive one readiness event: read what's available, pump the
    /// protocol over it, then flush whatever the protocol queued for
    /// output. Returns `false` once the connection should be torn down.
    fn drive(&mut self, readiness: Readiness, core: &mut dyn CoreOps, token: Token) -> bool {
        if readiness.readable {
            let mut buf = [0u8; 8192];
            loop {
                match self.stream.read(&mut buf) {
                    Ok(0) => {
                        (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Eof);
                        return false;
                    }
                    Ok(n) => {
                        self.input.extend(&buf[..n]);
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) => {
                        let kind = e.kind();
                        let err = CoreError::Io {
                            connection_id: token.0 as u64,
                            source: e,
                        };
                        tracing::debug!(%err, "tcp read failed");
                        (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Error(kind));
                        return false;
                    }
                }
            }
            if let Err(reason) = pump(&mut self.protocol, &mut self.input, &mut self.output) {
                let err = CoreError::ProtocolError {
                    connection_id: token.0 as u64,
                    reason,
                };
                tracing::debug!(%err, "closing connection");
                self.output.clear();
                (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Error(ErrorKind::InvalidData));
                return false;
            }
        }

        if readiness.writable || !self.output.is_empty() {
            while !self.output.is_empty() {
                match self.stream.write(self.output.pending()) {
                    Ok(0) => break,
                    Ok(n) => self.output.advance(n),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) => {
                        let kind = e.kind();
                        let err = CoreError::Io {
                            connection_id: token.0 as u64,
                            source: e,
                        };
                        tracing::debug!(%err, "tcp write failed");
                        (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Error(kind));
                        self.output.clear();
                        return false;
                    }
                }
            }
        }

        true
    }
}

fn accept_connection<P, F, D>(
    core: &mut dyn CoreOps,
    mut stream: TcpStream,
    make_protocol: &F,
    make_disconnect_handler: &D,
) where
    P: Protocol + 'static,
    F: Fn() -> P,
    D: Fn() -> Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason)>,
{
    let token = core.reserve_io_token();
    if let Err(e) = core
        .io_registry()
        .register(&mut stream, token, Interest::READABLE | Interest::WRITABLE)
    {
        tracing::warn!(error = %e, "failed to register accepted tcp connection");
        return;
    }

    let mut connection = Connection {
        stream,
        protocol: make_protocol(),
        input: InputBuffer::new(),
        output: OutputPipe::new(),
        on_disconnect: make_disconnect_handler(),
    };

    let installed = core.insert_io_source(Box::new(move |readiness, core| {
        if !connection.drive(readiness, core, token) {
            core.remove_io_source(token);
        }
    }));
    debug_assert_eq!(installed, token);
}

/// Bind a listener at `addr` on this core. `make_protocol` builds a fresh
/// [`Protocol`] for every accepted connection; `make_disconnect_handler`
/// builds the per-connection closure notified when that connection goes
/// away (§4.6's disconnected pseudo-event — routing it to a specific
/// actor, if any, is the closure's job, e.g. via `core.enqueue`).
pub(crate) fn listen<P, F, D>(
    core: &mut dyn CoreOps,
    addr: SocketAddr,
    make_protocol: F,
    make_disconnect_handler: D,
) -> io::Result<Token>
where
    P: Protocol + 'static,
    F: Fn() -> P + 'static,
    D: Fn() -> Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason)> + 'static,
{
    let token = core.reserve_io_token();
    let mut listener = TcpListener::bind(addr)?;
    core.io_registry().register(&mut listener, token, Interest::READABLE)?;

    let installed = core.insert_io_source(Box::new(move |_readiness, core| loop {
        match listener.accept() {
            Ok((stream, _peer)) => {
                accept_connection(core, stream, &make_protocol, &make_disconnect_handler)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) => {
                tracing::warn!(error = %e, "tcp accept failed");
                break;
            }
        }
    }));
    debug_assert_eq!(installed, token);
    Ok(token)
}

/// Open an outbound connection to `addr`, attaching `protocol` once it
/// completes (connect completion is itself a writable-readiness event on
/// a non-blocking socket, same as the original `TCPClient::connect`).
pub(crate) fn connect<P, D>(
    core: &mut dyn CoreOps,
    addr: SocketAddr,
    protocol: P,
    make_disconnect_handler: D,
) -> io::Result<Token>
where
    P: Protocol + 'static,
    D: Fn() -> Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason)> + 'static,
{
    let token = core.reserve_io_token();
    let mut stream = TcpStream::connect(addr)?;
    core.io_registry().register(&mut stream, token, Interest::READABLE | Interest::WRITABLE)?;

    let mut connection = Connection {
        stream,
        protocol,
        input: InputBuffer::new(),
        output: OutputPipe::new(),
        on_disconnect: make_disconnect_handler(),
    };

    let installed = core.insert_io_source(Box::new(move |readiness, core| {
        if !connection.drive(readiness, core, token) {
            core.remove_io_source(token);
        }
    }));
    debug_assert_eq!(installed, token);
    Ok(token)
}

/// Actor-facing wrappers: build the raw-`CoreOps` disconnect closure
/// `listen`/`connect` expect from a typed `(actor, ctx, ...)` callback, the
/// same way [`ActorContext::schedule_after`] wraps `DeferredFn` (§4.6).
impl<'a, A: Actor> ActorContext<'a, A> {
    /// Bind a listener on this actor's core; `on_disconnect` receives this
    /// actor and a fresh context for every connection that goes away.
    pub fn tcp_listen<P, F, D>(&mut self, addr: SocketAddr, make_protocol: F, on_disconnect: D) -> io::Result<Token>
    where
        P: Protocol + 'static,
        F: Fn() -> P + 'static,
        D: Fn() -> Box<dyn FnMut(&mut A, &mut ActorContext<'_, A>, u64, DisconnectReason)> + 'static,
        A: 'static,
    {
        let id = self.id();
        let handle = self.self_handle();
        let make_disconnect_handler = move || {
            let handle = Rc::clone(&handle);
            let mut body = on_disconnect();
            Box::new(move |core: &mut dyn CoreOps, conn_id: u64, reason: DisconnectReason| {
                let mut ctx = ActorContext::new(id, core, Rc::clone(&handle));
                let mut actor = handle.borrow_mut();
                body(&mut actor, &mut ctx, conn_id, reason);
            }) as Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason)>
        };
        listen(self.raw_core(), addr, make_protocol, make_disconnect_handler)
    }

    /// Open an outbound connection from this actor's core.
    pub fn tcp_connect<P, D>(&mut self, addr: SocketAddr, protocol: P, on_disconnect: D) -> io::Result<Token>
    where
        P: Protocol + 'static,
        D: Fn() -> Box<dyn FnMut(&mut A, &mut ActorContext<'_, A>, u64, DisconnectReason)> + 'static,
        A: 'static,
    {
        let id = self.id();
        let handle = self.self_handle();
        let make_disconnect_handler = move || {
            let handle = Rc::clone(&handle);
            let mut body = on_disconnect();
            Box::new(move |core: &mut dyn CoreOps, conn_id: u64, reason: DisconnectReason| {
                let mut ctx = ActorContext::new(id, core, Rc::clone(&handle));
                let mut actor = handle.borrow_mut();
                body(&mut actor, &mut ctx, conn_id, reason);
            }) as Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason)>
        };
        connect(self.raw_core(), addr, protocol, make_disconnect_handler)
    }
}
