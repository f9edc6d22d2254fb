use super::error::ArtNetError;
use super::layout;

pub struct ArtNetReader<'a> {
    payload: &'a [u8],
}

impl<'a> ArtNetReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), ArtNetError> {
        if self.payload.len() < needed {
            return Err(ArtNetError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u16_le(&self, range: std::ops::Range<usize>) -> Result<u16, ArtNetError> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 2 {
            return Err(ArtNetError::TooShort {
                needed: 2,
                actual: bytes.len(),
            });
        }
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], ArtNetError> {
        self.payload
            .get(range.clone())
            .ok_or(ArtNetError::TooShort {
                needed: range.end,
                actual: self.payload.len(),
            })
    }

    pub fn read_signature(&self) -> Result<&'a [u8], ArtNetError> {
        self.read_slice(0..layout::ARTNET_ID.len())
    }

    /// DMX data after the header, clamped to the ArtDMX maximum.
    pub fn read_dmx_data(&self) -> Result<&'a [u8], ArtNetError> {
        self.require_len(layout::DMX_DATA_OFFSET)?;
        let end = self.payload.len().min(layout::ARTDMX_PACKET_LEN);
        self.read_slice(layout::DMX_DATA_OFFSET..end)
    }
}

#[cfg(test)]
mod tests {
    use super::ArtNetReader;
    use crate::protocols::artnet::error::ArtNetError;
    use crate::protocols::artnet::layout;

    #[test]
    fn read_u16_le_decodes_little_endian() {
        let bytes = [0x00, 0x50];
        let reader = ArtNetReader::new(&bytes);
        assert_eq!(reader.read_u16_le(0..2).unwrap(), 0x5000);
    }

    #[test]
    fn read_slice_out_of_range() {
        let bytes = [0u8; 4];
        let reader = ArtNetReader::new(&bytes);
        let err = reader.read_slice(2..8).unwrap_err();
        assert!(matches!(
            err,
            ArtNetError::TooShort {
                needed: 8,
                actual: 4
            }
        ));
    }

    #[test]
    fn dmx_data_is_clamped_to_max_slots() {
        let bytes = vec![7u8; layout::ARTDMX_PACKET_LEN + 20];
        let reader = ArtNetReader::new(&bytes);
        assert_eq!(reader.read_dmx_data().unwrap().len(), layout::DMX_MAX_SLOTS);
    }

    #[test]
    fn dmx_data_may_be_empty() {
        let bytes = [0u8; layout::DMX_DATA_OFFSET];
        let reader = ArtNetReader::new(&bytes);
        assert!(reader.read_dmx_data().unwrap().is_empty());
    }
}
