use std::io::{BufWriter, Write};

use super::codec::encode_frame;
use super::error::TapeError;

/// Appends frame records to a byte sink.
pub struct TapeWriter<W: Write> {
    inner: BufWriter<W>,
    frames_written: u64,
}

impl<W: Write> TapeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
            frames_written: 0,
        }
    }

    pub fn write_frame(&mut self, timestamp: f32, channels: &[u8]) -> Result<(), TapeError> {
        let record = encode_frame(timestamp, channels)?;
        self.inner.write_all(&record)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush buffered records and hand back the underlying sink.
    pub fn finish(self) -> Result<W, TapeError> {
        self.inner
            .into_inner()
            .map_err(|err| TapeError::Io(err.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::TapeWriter;
    use crate::tape::error::{FrameError, TapeError};
    use crate::tape::layout;

    #[test]
    fn writes_fixed_size_records() {
        let mut writer = TapeWriter::new(Vec::new());
        writer.write_frame(0.0, &[1u8; 512]).unwrap();
        writer.write_frame(0.04, &[2u8; 512]).unwrap();
        assert_eq!(writer.frames_written(), 2);
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len(), 2 * layout::FRAME_RECORD_SIZE);
        assert_eq!(bytes[layout::FRAME_RECORD_SIZE + 4], 2);
    }

    #[test]
    fn invalid_frame_writes_nothing() {
        let mut writer = TapeWriter::new(Vec::new());
        let err = writer.write_frame(0.0, &[0u8; 3]).unwrap_err();
        assert!(matches!(
            err,
            TapeError::Frame(FrameError::InvalidChannelLength { .. })
        ));
        assert_eq!(writer.frames_written(), 0);
        assert!(writer.finish().unwrap().is_empty());
    }
}
