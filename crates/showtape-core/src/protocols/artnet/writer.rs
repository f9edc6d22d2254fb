use super::error::ArtNetError;
use super::layout;

/// Build a complete ArtDMX datagram for one universe.
///
/// The universe is written as given; no Port-Address range check is applied.
/// Sequencing is disabled (sequence byte 0).
pub fn encode_packet(universe: u16, channels: &[u8]) -> Result<Vec<u8>, ArtNetError> {
    if channels.len() != layout::DMX_MAX_SLOTS {
        return Err(ArtNetError::InvalidChannelLength {
            expected: layout::DMX_MAX_SLOTS,
            actual: channels.len(),
        });
    }

    let mut packet = vec![0u8; layout::ARTDMX_PACKET_LEN];
    packet[..layout::ARTNET_ID.len()].copy_from_slice(layout::ARTNET_ID);
    packet[layout::OP_CODE_RANGE.clone()].copy_from_slice(&layout::ARTDMX_OPCODE.to_le_bytes());
    packet[layout::PROTOCOL_VERSION_RANGE.clone()]
        .copy_from_slice(&layout::PROTOCOL_VERSION.to_be_bytes());
    packet[layout::SEQUENCE_OFFSET] = 0;
    packet[layout::PHYSICAL_OFFSET] = 0;
    packet[layout::UNIVERSE_RANGE.clone()].copy_from_slice(&universe.to_le_bytes());
    packet[layout::LENGTH_RANGE.clone()]
        .copy_from_slice(&(layout::DMX_MAX_SLOTS as u16).to_be_bytes());
    packet[layout::DMX_DATA_OFFSET..].copy_from_slice(channels);
    Ok(packet)
}
