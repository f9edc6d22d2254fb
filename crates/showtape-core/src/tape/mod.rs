//! Tape storage: the binary capture format.
//!
//! A tape is a headerless sequence of 516-byte records, each a little-endian
//! `f32` timestamp (seconds since the recording trigger) followed by 512 raw
//! DMX slots. End of file is the only terminator. A trailing partial record is
//! the signature of an interrupted write and is discarded on read.
//!
//! `codec` converts single records, `reader`/`writer` stream them, and `dir`
//! allocates uniquely named tape files for new sessions.

pub mod codec;
pub mod dir;
pub mod error;
pub mod layout;
pub mod reader;
pub mod writer;

pub use codec::{LightingFrame, decode_frame, encode_frame};
pub use dir::TapeDir;
pub use layout::{DMX_SLOTS, FRAME_RECORD_SIZE};
pub use error::{FrameError, TapeError};
pub use reader::TapeReader;
pub use writer::TapeWriter;
