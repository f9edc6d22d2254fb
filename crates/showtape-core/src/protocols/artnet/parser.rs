use super::layout;
use super::reader::ArtNetReader;

/// Inbound Art-Net datagram, borrowed from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtNetPacket<'a> {
    pub opcode: u16,
    pub universe: u16,
    pub payload: &'a [u8],
}

impl ArtNetPacket<'_> {
    /// True when this is an ArtDMX packet addressed to `universe`.
    pub fn is_dmx_for(&self, universe: u16) -> bool {
        self.opcode == layout::ARTDMX_OPCODE && self.universe == universe
    }

    /// True when the sender supplied fewer than 512 slots.
    pub fn is_truncated(&self) -> bool {
        self.payload.len() < layout::DMX_MAX_SLOTS
    }

    /// Payload copied into a full universe; missing slots read as zero.
    pub fn slots(&self) -> [u8; layout::DMX_MAX_SLOTS] {
        let mut slots = [0u8; layout::DMX_MAX_SLOTS];
        let len = self.payload.len().min(layout::DMX_MAX_SLOTS);
        slots[..len].copy_from_slice(&self.payload[..len]);
        slots
    }
}

/// Decode an inbound datagram.
///
/// Only the minimum length and the `Art-Net\0` signature are checked. The
/// protocol version and length fields are not validated, and any opcode is
/// returned so callers decide what is relevant.
pub fn decode_packet(datagram: &[u8]) -> Option<ArtNetPacket<'_>> {
    let reader = ArtNetReader::new(datagram);
    reader.require_len(layout::DMX_DATA_OFFSET).ok()?;

    let signature = reader.read_signature().ok()?;
    if signature != layout::ARTNET_ID {
        return None;
    }

    let opcode = reader.read_u16_le(layout::OP_CODE_RANGE.clone()).ok()?;
    let universe = reader.read_u16_le(layout::UNIVERSE_RANGE.clone()).ok()?;
    let payload = reader.read_dmx_data().ok()?;

    Some(ArtNetPacket {
        opcode,
        universe,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::decode_packet;
    use crate::protocols::artnet::layout;

    fn artdmx(universe: u16, data: &[u8]) -> Vec<u8> {
        let mut payload = vec![0u8; layout::DMX_DATA_OFFSET + data.len()];
        payload[..layout::ARTNET_ID.len()].copy_from_slice(layout::ARTNET_ID);
        payload[layout::OP_CODE_RANGE.clone()]
            .copy_from_slice(&layout::ARTDMX_OPCODE.to_le_bytes());
        payload[layout::UNIVERSE_RANGE.clone()].copy_from_slice(&universe.to_le_bytes());
        payload[layout::LENGTH_RANGE.clone()]
            .copy_from_slice(&(data.len() as u16).to_be_bytes());
        payload[layout::DMX_DATA_OFFSET..].copy_from_slice(data);
        payload
    }

    #[test]
    fn decode_valid_artdmx() {
        let mut data = [0u8; 512];
        data[0] = 255;
        data[511] = 9;
        let datagram = artdmx(3, &data);

        let packet = decode_packet(&datagram).unwrap();
        assert_eq!(packet.opcode, layout::ARTDMX_OPCODE);
        assert_eq!(packet.universe, 3);
        assert_eq!(packet.payload, &data[..]);
        assert!(packet.is_dmx_for(3));
        assert!(!packet.is_dmx_for(0));
        assert!(!packet.is_truncated());
    }

    #[test]
    fn decode_rejects_short_datagram() {
        let datagram = artdmx(0, &[]);
        assert!(decode_packet(&datagram[..layout::DMX_DATA_OFFSET - 1]).is_none());
        assert!(decode_packet(&[]).is_none());
    }

    #[test]
    fn decode_rejects_wrong_signature() {
        let mut datagram = artdmx(0, &[1, 2, 3]);
        datagram[7] = b'!';
        assert!(decode_packet(&datagram).is_none());

        let mut datagram = artdmx(0, &[1, 2, 3]);
        datagram[..8].copy_from_slice(b"ASC-E1.1");
        assert!(decode_packet(&datagram).is_none());
    }

    #[test]
    fn decode_keeps_other_opcodes() {
        let mut datagram = artdmx(0, &[1]);
        datagram[layout::OP_CODE_RANGE.clone()].copy_from_slice(&0x2000u16.to_le_bytes());
        let packet = decode_packet(&datagram).unwrap();
        assert_eq!(packet.opcode, 0x2000);
        assert!(!packet.is_dmx_for(0));
    }

    #[test]
    fn decode_ignores_length_field() {
        let mut datagram = artdmx(1, &[5u8; 512]);
        datagram[layout::LENGTH_RANGE.clone()].copy_from_slice(&2u16.to_be_bytes());
        let packet = decode_packet(&datagram).unwrap();
        assert_eq!(packet.payload.len(), 512);
    }

    #[test]
    fn truncated_payload_pads_slots() {
        let datagram = artdmx(0, &[10, 20, 30, 40]);
        let packet = decode_packet(&datagram).unwrap();
        assert!(packet.is_truncated());
        let slots = packet.slots();
        assert_eq!(&slots[..4], &[10, 20, 30, 40]);
        assert!(slots[4..].iter().all(|&value| value == 0));
    }

    #[test]
    fn trailing_bytes_beyond_universe_are_dropped() {
        let mut datagram = artdmx(0, &[1u8; 512]);
        datagram.extend_from_slice(&[9, 9, 9]);
        let packet = decode_packet(&datagram).unwrap();
        assert_eq!(packet.payload.len(), 512);
    }
}
