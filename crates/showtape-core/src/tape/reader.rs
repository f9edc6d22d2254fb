use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::warn;

use super::codec::{LightingFrame, decode_frame};
use super::error::TapeError;
use super::layout;

/// Streaming reader over a sequence of fixed-size frame records.
///
/// A file that ends mid-record is treated as ending at the last complete
/// record; the dangling bytes are counted in [`TapeReader::truncated_bytes`]
/// and never decoded.
pub struct TapeReader<R: Read> {
    inner: R,
    record: [u8; layout::FRAME_RECORD_SIZE],
    frames_read: u64,
    truncated_bytes: usize,
    finished: bool,
}

impl TapeReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, TapeError> {
        let file = File::open(path).map_err(|source| TapeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> TapeReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            record: [0u8; layout::FRAME_RECORD_SIZE],
            frames_read: 0,
            truncated_bytes: 0,
            finished: false,
        }
    }

    /// Next complete frame, or `None` at the end of the tape.
    pub fn next_frame(&mut self) -> Result<Option<LightingFrame>, TapeError> {
        if self.finished {
            return Ok(None);
        }
        let filled = fill_record(&mut self.inner, &mut self.record)?;
        if filled == 0 {
            self.finished = true;
            return Ok(None);
        }
        if filled < layout::FRAME_RECORD_SIZE {
            self.finished = true;
            self.truncated_bytes = filled;
            warn!(
                "tape ends with a partial record ({} of {} bytes) after frame {}; ignoring it",
                filled,
                layout::FRAME_RECORD_SIZE,
                self.frames_read
            );
            return Ok(None);
        }
        let frame = decode_frame(&self.record)?;
        self.frames_read += 1;
        Ok(Some(frame))
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Bytes of a dangling partial record seen at the end of the tape.
    pub fn truncated_bytes(&self) -> usize {
        self.truncated_bytes
    }
}

impl<R: Read> Iterator for TapeReader<R> {
    type Item = Result<LightingFrame, TapeError>;

    /// Iteration ends after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.next_frame().transpose();
        if matches!(item, Some(Err(_))) {
            self.finished = true;
        }
        item
    }
}

fn fill_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::TapeReader;
    use crate::tape::codec::encode_frame;
    use crate::tape::error::TapeError;
    use std::io::{self, Cursor, Read};

    fn tape(frames: &[(f32, u8)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (timestamp, value) in frames {
            bytes.extend_from_slice(&encode_frame(*timestamp, &[*value; 512]).unwrap());
        }
        bytes
    }

    #[test]
    fn reads_all_complete_records() {
        let bytes = tape(&[(0.0, 1), (0.5, 2), (1.0, 3)]);
        let mut reader = TapeReader::new(Cursor::new(bytes));
        let mut stamps = Vec::new();
        while let Some(frame) = reader.next_frame().unwrap() {
            stamps.push(frame.timestamp);
        }
        assert_eq!(stamps, vec![0.0, 0.5, 1.0]);
        assert_eq!(reader.frames_read(), 3);
        assert_eq!(reader.truncated_bytes(), 0);
    }

    #[test]
    fn empty_tape_has_no_frames() {
        let mut reader = TapeReader::new(Cursor::new(Vec::new()));
        assert!(reader.next_frame().unwrap().is_none());
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn partial_tail_is_discarded() {
        let mut bytes = tape(&[(0.0, 1), (0.1, 2)]);
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe]);
        let reader = TapeReader::new(Cursor::new(bytes));
        let frames: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].channels, [2u8; 512]);
    }

    #[test]
    fn partial_tail_is_counted() {
        let mut bytes = tape(&[(0.0, 1)]);
        bytes.extend_from_slice(&[0u8; 515]);
        let mut reader = TapeReader::new(Cursor::new(bytes));
        assert!(reader.next_frame().unwrap().is_some());
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.truncated_bytes(), 515);
    }

    struct Trickle {
        data: Vec<u8>,
        pos: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(7).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn short_reads_are_reassembled() {
        let data = tape(&[(0.0, 4), (2.0, 5)]);
        let mut reader = TapeReader::new(Trickle { data, pos: 0 });
        assert_eq!(reader.next_frame().unwrap().unwrap().channels, [4u8; 512]);
        assert_eq!(reader.next_frame().unwrap().unwrap().timestamp, 2.0);
        assert!(reader.next_frame().unwrap().is_none());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    #[test]
    fn io_errors_propagate() {
        let mut reader = TapeReader::new(Broken);
        let err = reader.next_frame().unwrap_err();
        assert!(matches!(err, TapeError::Io(_)));
    }
}
