use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use log::debug;
use socket2::{Domain, Protocol, Socket, Type};

use super::{Datagram, DatagramSource, SourceError};
use crate::cancel::CancelToken;

/// Poll interval of the blocking receive; bounds cancellation latency.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);
/// Larger than any ArtDMX packet (530 bytes).
const RECV_BUFFER_LEN: usize = 1024;

/// Live UDP listener.
pub struct UdpSource {
    socket: UdpSocket,
    epoch: Instant,
    buf: [u8; RECV_BUFFER_LEN],
}

impl UdpSource {
    /// Bind a listening socket with `SO_REUSEADDR` so consoles and other
    /// Art-Net tools sharing the host do not lock us out.
    pub fn bind(addr: SocketAddr) -> Result<Self, SourceError> {
        let socket = bind_reusable(addr).map_err(|source| SourceError::Bind { addr, source })?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        debug!("listening for Art-Net on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            epoch: Instant::now(),
            buf: [0u8; RECV_BUFFER_LEN],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

fn bind_reusable(addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

impl DatagramSource for UdpSource {
    fn next_datagram(&mut self, cancel: &CancelToken) -> Result<Option<Datagram>, SourceError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            match self.socket.recv_from(&mut self.buf) {
                Ok((len, _peer)) => {
                    return Ok(Some(Datagram {
                        at: self.epoch.elapsed(),
                        data: self.buf[..len].to_vec(),
                    }));
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    continue;
                }
                // Windows reports ICMP port-unreachable from earlier sends here.
                Err(err) if err.kind() == io::ErrorKind::ConnectionReset => continue,
                Err(err) => return Err(SourceError::Io(err)),
            }
        }
    }
}
