//! Art-Net (ArtDMX subset) encoding and decoding.
//!
//! Outbound packets are always full 512-slot ArtDMX datagrams. Inbound
//! decoding is deliberately permissive: a datagram is accepted when it is at
//! least as long as the ArtDMX header and starts with the `Art-Net\0`
//! signature. Opcode and universe are returned as-is so the capture loop can
//! filter them; protocol version and length fields are informational only.
//!
//! Byte offsets live in `layout`, bounds-checked access in `reader`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod writer;

pub use error::ArtNetError;
pub use parser::{ArtNetPacket, decode_packet};
pub use writer::encode_packet;
