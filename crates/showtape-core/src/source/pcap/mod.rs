//! PCAP/PCAPNG capture import.
//!
//! Replays the UDP payloads of an offline capture as a datagram source, so a
//! tape can be cut from a network capture taken by another tool. Link-layer
//! framing is stripped with `etherparse`; packets that are not UDP are
//! skipped.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod udp;

pub use parser::PcapFileSource;
