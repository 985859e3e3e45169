//! TLS-wrapped TCP transport (§4.6), layering `rustls` over the same
//! `Protocol`/`InputBuffer`/`OutputPipe` plumbing `tcp.rs` uses for
//! plaintext connections. Each side drives its own `rustls::Connection`
//! (`ServerConnection`/`ClientConnection`): ciphertext moves through the
//! raw socket via `read_tls`/`write_tls` and `process_new_packets`, while
//! application bytes flow through rustls's own reader/writer once the
//! handshake completes.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use mio::net::{TcpListener, TcpStream};
use mio::{Interest, Token};
use rustls::{Certificate, ClientConfig, ClientConnection, PrivateKey, ServerConfig, ServerConnection, ServerName};

use crate::actor::{Actor, ActorContext};
use crate::error::CoreError;
use crate::event::{CoreOps, Readiness};

use super::protocol::{pump, InputBuffer, OutputPipe, Protocol};
use super::tcp::DisconnectReason;

/// Which side of the handshake a connection is driving. Both sides pump
/// identically once the session is established; this is kept only for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsRole {
    Server,
    Client,
}

enum Session {
    Server(ServerConnection),
    Client(ClientConnection),
}

impl Session {
    fn role(&self) -> TlsRole {
        match self {
            Session::Server(_) => TlsRole::Server,
            Session::Client(_) => TlsRole::Client,
        }
    }

    fn read_tls(&mut self, rd: &mut dyn Read) -> io::Result<usize> {
        match self {
            Session::Server(c) => c.read_tls(rd),
            Session::Client(c) => c.read_tls(rd),
        }
    }

    fn write_tls(&mut self, wr: &mut dyn Write) -> io::Result<usize> {
        match self {
            Session::Server(c) => c.write_tls(wr),
            Session::Client(c) => c.write_tls(wr),
        }
    }

    fn process_new_packets(&mut self) -> Result<(), rustls::Error> {
        let result = match self {
            Session::Server(c) => c.process_new_packets().map(|_| ()),
            Session::Client(c) => c.process_new_packets().map(|_| ()),
        };
        result
    }

    fn wants_write(&self) -> bool {
        match self {
            Session::Server(c) => c.wants_write(),
            Session::Client(c) => c.wants_write(),
        }
    }

    fn reader(&mut self) -> rustls::Reader<'_> {
        match self {
            Session::Server(c) => c.reader(),
            Session::Client(c) => c.reader(),
        }
    }

    fn writer(&mut self) -> rustls::Writer<'_> {
        match self {
            Session::Server(c) => c.writer(),
            Session::Client(c) => c.writer(),
        }
    }
}

struct TlsConnection<P: Protocol> {
    stream: TcpStream,
    session: Session,
    protocol: P,
    input: InputBuffer,
    output: OutputPipe,
    on_disconnect: Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason, TlsRole)>,
}

impl<P: Protocol> TlsConnection<P> {
    fn drive(&mut self, readiness: Readiness, core: &mut dyn CoreOps, token: Token) -> bool {
        if readiness.readable {
            loop {
                match self.session.read_tls(&mut self.stream) {
                    Ok(0) => {
                        (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Eof, self.session.role());
                        return false;
                    }
                    Ok(_) => {}
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) => {
                        let kind = e.kind();
                        let err = CoreError::Io {
                            connection_id: token.0 as u64,
                            source: e,
                        };
                        tracing::debug!(%err, "tls read failed");
                        (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Error(kind), self.session.role());
                        return false;
                    }
                }
            }

            if let Err(e) = self.session.process_new_packets() {
                let err = CoreError::ProtocolError {
                    connection_id: token.0 as u64,
                    reason: e.to_string(),
                };
                tracing::warn!(%err, "tls handshake/record error");
                (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Error(ErrorKind::InvalidData), self.session.role());
                return false;
            }

            let mut buf = [0u8; 8192];
            loop {
                match self.session.reader().read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => self.input.extend(&buf[..n]),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) => {
                        let kind = e.kind();
                        let err = CoreError::Io {
                            connection_id: token.0 as u64,
                            source: e,
                        };
                        tracing::debug!(%err, "tls application read failed");
                        (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Error(kind), self.session.role());
                        return false;
                    }
                }
            }
            if let Err(reason) = pump(&mut self.protocol, &mut self.input, &mut self.output) {
                let err = CoreError::ProtocolError {
                    connection_id: token.0 as u64,
                    reason,
                };
                tracing::debug!(%err, "closing tls connection");
                self.output.clear();
                (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Error(ErrorKind::InvalidData), self.session.role());
                return false;
            }
        }

        if !self.output.is_empty() {
            if let Ok(written) = self.session.writer().write(self.output.pending()) {
                self.output.advance(written);
            }
        }

        while self.session.wants_write() {
            match self.session.write_tls(&mut self.stream) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    let kind = e.kind();
                    let err = CoreError::Io {
                        connection_id: token.0 as u64,
                        source: e,
                    };
                    tracing::debug!(%err, "tls write failed");
                    (self.on_disconnect)(core, token.0 as u64, DisconnectReason::Error(kind), self.session.role());
                    self.output.clear();
                    return false;
                }
            }
        }

        true
    }
}

fn accept_connection<P, F, D>(
    core: &mut dyn CoreOps,
    mut stream: TcpStream,
    config: &Arc<ServerConfig>,
    make_protocol: &F,
    make_disconnect_handler: &D,
) where
    P: Protocol + 'static,
    F: Fn() -> P,
    D: Fn() -> Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason, TlsRole)>,
{
    let session = match ServerConnection::new(Arc::clone(config)) {
        Ok(session) => Session::Server(session),
        Err(e) => {
            tracing::warn!(error = %e, "failed to start tls server session");
            return;
        }
    };

    let token = core.reserve_io_token();
    if let Err(e) = core
        .io_registry()
        .register(&mut stream, token, Interest::READABLE | Interest::WRITABLE)
    {
        tracing::warn!(error = %e, "failed to register accepted tls connection");
        return;
    }

    let mut connection = TlsConnection {
        stream,
        session,
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

/// Bind a TLS listener at `addr`, handshaking every accepted connection as
/// a server with `config` before handing it to `make_protocol`.
pub(crate) fn listen_tls<P, F, D>(
    core: &mut dyn CoreOps,
    addr: SocketAddr,
    config: Arc<ServerConfig>,
    make_protocol: F,
    make_disconnect_handler: D,
) -> io::Result<Token>
where
    P: Protocol + 'static,
    F: Fn() -> P + 'static,
    D: Fn() -> Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason, TlsRole)> + 'static,
{
    let token = core.reserve_io_token();
    let mut listener = TcpListener::bind(addr)?;
    core.io_registry().register(&mut listener, token, Interest::READABLE)?;

    let installed = core.insert_io_source(Box::new(move |_readiness, core| loop {
        match listener.accept() {
            Ok((stream, _peer)) => accept_connection(
                core,
                stream,
                &config,
                &make_protocol,
                &make_disconnect_handler,
            ),
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) => {
                tracing::warn!(error = %e, "tls accept failed");
                break;
            }
        }
    }));
    debug_assert_eq!(installed, token);
    Ok(token)
}

/// Open an outbound TLS connection to `addr`, handshaking as a client
/// against `server_name` under `config`.
pub(crate) fn connect_tls<P, D>(
    core: &mut dyn CoreOps,
    addr: SocketAddr,
    config: Arc<ClientConfig>,
    server_name: ServerName,
    protocol: P,
    make_disconnect_handler: D,
) -> io::Result<Token>
where
    P: Protocol + 'static,
    D: Fn() -> Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason, TlsRole)> + 'static,
{
    let session = ClientConnection::new(config, server_name)
        .map_err(|e| io::Error::new(ErrorKind::InvalidInput, e))?;

    let token = core.reserve_io_token();
    let mut stream = TcpStream::connect(addr)?;
    core.io_registry()
        .register(&mut stream, token, Interest::READABLE | Interest::WRITABLE)?;

    let mut connection = TlsConnection {
        stream,
        session: Session::Client(session),
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

/// Load a PEM certificate chain from `path`, for building a [`ServerConfig`].
pub fn load_certs(path: impl AsRef<Path>) -> io::Result<Vec<Certificate>> {
    let mut reader = BufReader::new(File::open(path)?);
    let raw = rustls_pemfile::certs(&mut reader)?;
    Ok(raw.into_iter().map(Certificate).collect())
}

/// Load a PEM PKCS8 private key from `path`, for building a [`ServerConfig`].
pub fn load_private_key(path: impl AsRef<Path>) -> io::Result<PrivateKey> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut keys = rustls_pemfile::pkcs8_private_keys(&mut reader)?;
    keys.pop()
        .map(PrivateKey)
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, "no private key found in file"))
}

impl<'a, A: Actor> ActorContext<'a, A> {
    /// Bind a TLS listener on this actor's core.
    pub fn listen_tls<P, F, D>(
        &mut self,
        addr: SocketAddr,
        config: Arc<ServerConfig>,
        make_protocol: F,
        on_disconnect: D,
    ) -> io::Result<Token>
    where
        P: Protocol + 'static,
        F: Fn() -> P + 'static,
        D: Fn() -> Box<dyn FnMut(&mut A, &mut ActorContext<'_, A>, u64, DisconnectReason, TlsRole)> + 'static,
        A: 'static,
    {
        let id = self.id();
        let handle = self.self_handle();
        let make_disconnect_handler = move || {
            let handle = Rc::clone(&handle);
            let mut body = on_disconnect();
            Box::new(move |core: &mut dyn CoreOps, conn_id: u64, reason: DisconnectReason, role: TlsRole| {
                let mut ctx = ActorContext::new(id, core, Rc::clone(&handle));
                let mut actor = handle.borrow_mut();
                body(&mut actor, &mut ctx, conn_id, reason, role);
            }) as Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason, TlsRole)>
        };
        listen_tls(self.raw_core(), addr, config, make_protocol, make_disconnect_handler)
    }

    /// Open an outbound TLS connection from this actor's core.
    pub fn connect_tls<P, D>(
        &mut self,
        addr: SocketAddr,
        config: Arc<ClientConfig>,
        server_name: ServerName,
        protocol: P,
        on_disconnect: D,
    ) -> io::Result<Token>
    where
        P: Protocol + 'static,
        D: Fn() -> Box<dyn FnMut(&mut A, &mut ActorContext<'_, A>, u64, DisconnectReason, TlsRole)> + 'static,
        A: 'static,
    {
        let id = self.id();
        let handle = self.self_handle();
        let make_disconnect_handler = move || {
            let handle = Rc::clone(&handle);
            let mut body = on_disconnect();
            Box::new(move |core: &mut dyn CoreOps, conn_id: u64, reason: DisconnectReason, role: TlsRole| {
                let mut ctx = ActorContext::new(id, core, Rc::clone(&handle));
                let mut actor = handle.borrow_mut();
                body(&mut actor, &mut ctx, conn_id, reason, role);
            }) as Box<dyn FnMut(&mut dyn CoreOps, u64, DisconnectReason, TlsRole)>
        };
        connect_tls(self.raw_core(), addr, config, server_name, protocol, make_disconnect_handler)
    }
}
