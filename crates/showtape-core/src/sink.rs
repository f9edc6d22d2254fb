//! Outbound datagram transport.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use log::debug;

pub trait DatagramSink {
    fn send(&mut self, datagram: &[u8]) -> io::Result<()>;
}

/// Collects datagrams in memory.
impl DatagramSink for Vec<Vec<u8>> {
    fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        self.push(datagram.to_vec());
        Ok(())
    }
}

/// UDP sender bound to an ephemeral local port.
///
/// Broadcast is enabled so a limited-broadcast target reaches every node on
/// the segment. The socket closes when the sink is dropped.
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    pub fn connect(target: SocketAddr) -> io::Result<Self> {
        let bind: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind)?;
        if target.is_ipv4() {
            socket.set_broadcast(true)?;
        }
        debug!("Art-Net sink {} -> {}", socket.local_addr()?, target);
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl DatagramSink for UdpSink {
    fn send(&mut self, datagram: &[u8]) -> io::Result<()> {
        self.socket.send_to(datagram, self.target)?;
        Ok(())
    }
}
