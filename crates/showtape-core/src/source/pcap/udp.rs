use etherparse::{SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::SliceError;

/// Art-Net payload carried by a captured frame, if it is a UDP datagram.
///
/// Returns `Ok(None)` for other transports and for linktypes other than
/// Ethernet or raw IP.
pub fn parse_udp_payload(linktype: Linktype, data: &[u8]) -> Result<Option<&[u8]>, SliceError> {
    let sliced = match linktype {
        Linktype::ETHERNET => SlicedPacket::from_ethernet(data),
        Linktype::RAW => SlicedPacket::from_ip(data),
        _ => return Ok(None),
    }
    .map_err(|e| SliceError(e.to_string()))?;

    match sliced.transport {
        Some(TransportSlice::Udp(udp)) => Ok(Some(udp.payload())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_udp_payload;
    use etherparse::PacketBuilder;
    use pcap_parser::Linktype;

    #[test]
    fn ethernet_udp_payload() {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4([192, 168, 0, 1], [192, 168, 0, 2], 64)
            .udp(6454, 6454);
        let payload = [1, 2, 3, 4];
        let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, &payload).unwrap();

        let parsed = parse_udp_payload(Linktype::ETHERNET, &packet).unwrap();
        assert_eq!(parsed, Some(&payload[..]));
    }

    #[test]
    fn raw_ip_payload() {
        let builder = PacketBuilder::ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64).udp(1000, 6454);
        let payload = [9u8; 3];
        let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, &payload).unwrap();

        let parsed = parse_udp_payload(Linktype::RAW, &packet).unwrap();
        assert_eq!(parsed, Some(&payload[..]));
    }

    #[test]
    fn tcp_is_not_a_datagram() {
        let builder = PacketBuilder::ethernet2([1, 1, 1, 1, 1, 1], [2, 2, 2, 2, 2, 2])
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(1000, 1001, 0, 0);
        let payload = [0u8; 4];
        let mut packet = Vec::<u8>::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, &payload).unwrap();

        assert!(parse_udp_payload(Linktype::ETHERNET, &packet).unwrap().is_none());
    }

    #[test]
    fn other_linktypes_are_ignored() {
        assert!(parse_udp_payload(Linktype::NULL, &[0u8; 32]).unwrap().is_none());
    }

    #[test]
    fn truncated_frame_is_an_error() {
        assert!(parse_udp_payload(Linktype::ETHERNET, &[0u8; 6]).is_err());
    }
}
