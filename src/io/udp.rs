//! UDP client/server primitives (§4.6, §6.2), grounded on
//! `original_source/io/example4_udp_networking.cpp`'s `UDPServer`/
//! `UDPClient`: unlike TCP there is no stream to frame — each datagram
//! already is one message, delivered whole to `on_datagram` with the
//! sender's address so a reply can be addressed with `send_to`.

use std::cell::RefCell;
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::rc::Rc;

use mio::net::UdpSocket;
use mio::{Interest, Token};

use crate::actor::{Actor, ActorContext};
use crate::event::CoreOps;

/// A bound UDP socket, shared between the reactor callback that reads it
/// and whatever actor code holds this handle to write through it.
#[derive(Clone)]
pub struct UdpHandle {
    socket: Rc<RefCell<UdpSocket>>,
    token: Token,
}

impl UdpHandle {
    pub fn token(&self) -> Token {
        self.token
    }

    pub fn send_to(&self, data: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.socket.borrow_mut().send_to(data, target)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.borrow().local_addr()
    }
}

/// Bind a UDP socket at `addr`, delivering every received datagram to
/// `on_datagram(core, sender, bytes)`.
pub(crate) fn bind<F>(core: &mut dyn CoreOps, addr: SocketAddr, mut on_datagram: F) -> io::Result<UdpHandle>
where
    F: FnMut(&mut dyn CoreOps, SocketAddr, &[u8]) + 'static,
{
    let token = core.reserve_io_token();
    let mut socket = UdpSocket::bind(addr)?;
    core.io_registry().register(&mut socket, token, Interest::READABLE)?;

    let socket = Rc::new(RefCell::new(socket));
    let socket_for_callback = Rc::clone(&socket);

    let installed = core.insert_io_source(Box::new(move |readiness, core| {
        if !readiness.readable {
            return;
        }
        let mut buf = [0u8; 65_507];
        loop {
            let received = socket_for_callback.borrow_mut().recv_from(&mut buf);
            match received {
                Ok((n, peer)) => on_datagram(core, peer, &buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::warn!(error = %e, "udp recv_from failed");
                    break;
                }
            }
        }
    }));
    debug_assert_eq!(installed, token);

    Ok(UdpHandle { socket, token })
}

impl<'a, A: Actor> ActorContext<'a, A> {
    /// Bind a UDP socket on this actor's core, delivering each datagram to
    /// `on_datagram(actor, ctx, sender, bytes)`.
    pub fn udp_bind<F>(&mut self, addr: SocketAddr, mut on_datagram: F) -> io::Result<UdpHandle>
    where
        F: FnMut(&mut A, &mut ActorContext<'_, A>, SocketAddr, &[u8]) + 'static,
        A: 'static,
    {
        let id = self.id();
        let handle = self.self_handle();
        bind(self.raw_core(), addr, move |core, peer, bytes| {
            let mut ctx = ActorContext::new(id, core, Rc::clone(&handle));
            let mut actor = handle.borrow_mut();
            on_datagram(&mut actor, &mut ctx, peer, bytes);
        })
    }
}
