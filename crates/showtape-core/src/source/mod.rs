//! Inbound datagram sources for the capture loop.
//!
//! A source yields raw UDP payloads stamped with a monotonic receive time
//! relative to the source's own epoch. The capture loop derives every
//! elapsed time from these stamps, so a live socket and an offline capture
//! drive exactly the same trigger and timing logic.

mod pcap;
mod udp;

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub use pcap::PcapFileSource;
pub use udp::UdpSource;

use crate::cancel::CancelToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Receive time relative to the source's epoch.
    pub at: Duration,
    pub data: Vec<u8>,
}

pub trait DatagramSource {
    /// Next datagram; `Ok(None)` at end of stream or once `cancel` fires.
    fn next_datagram(&mut self, cancel: &CancelToken) -> Result<Option<Datagram>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error: {0}")]
    Pcap(String),
}

impl From<pcap::error::CaptureError> for SourceError {
    fn from(value: pcap::error::CaptureError) -> Self {
        match value {
            pcap::error::CaptureError::Read(err) => SourceError::Io(err),
            pcap::error::CaptureError::Malformed { stage, message } => {
                SourceError::Pcap(format!("{stage}: {message}"))
            }
        }
    }
}
