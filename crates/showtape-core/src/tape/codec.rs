use super::error::FrameError;
use super::layout;

/// One timestamped snapshot of a full DMX universe.
#[derive(Debug, Clone, PartialEq)]
pub struct LightingFrame {
    /// Seconds since the start of the recording.
    pub timestamp: f32,
    pub channels: [u8; layout::DMX_SLOTS],
}

impl LightingFrame {
    pub fn new(timestamp: f32, channels: [u8; layout::DMX_SLOTS]) -> Self {
        Self {
            timestamp,
            channels,
        }
    }
}

/// Serialize one frame into its 516-byte record.
pub fn encode_frame(
    timestamp: f32,
    channels: &[u8],
) -> Result<[u8; layout::FRAME_RECORD_SIZE], FrameError> {
    if channels.len() != layout::DMX_SLOTS {
        return Err(FrameError::InvalidChannelLength {
            expected: layout::DMX_SLOTS,
            actual: channels.len(),
        });
    }
    let mut record = [0u8; layout::FRAME_RECORD_SIZE];
    record[layout::TIMESTAMP_RANGE].copy_from_slice(&timestamp.to_le_bytes());
    record[layout::CHANNELS_RANGE].copy_from_slice(channels);
    Ok(record)
}

/// Deserialize one record. Bytes past the first record are not inspected.
pub fn decode_frame(bytes: &[u8]) -> Result<LightingFrame, FrameError> {
    let record = bytes
        .get(..layout::FRAME_RECORD_SIZE)
        .ok_or(FrameError::ShortRead {
            needed: layout::FRAME_RECORD_SIZE,
            actual: bytes.len(),
        })?;
    let mut ts = [0u8; layout::TIMESTAMP_LEN];
    ts.copy_from_slice(&record[layout::TIMESTAMP_RANGE]);
    let mut channels = [0u8; layout::DMX_SLOTS];
    channels.copy_from_slice(&record[layout::CHANNELS_RANGE]);
    Ok(LightingFrame {
        timestamp: f32::from_le_bytes(ts),
        channels,
    })
}
