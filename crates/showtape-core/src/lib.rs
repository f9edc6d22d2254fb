//! Showtape core library: record an Art-Net universe to a tape and play it
//! back on the recorded timeline.
//!
//! The crate is split the same way in both directions: datagram transport
//! (`source`, `sink`) is kept apart from the Art-Net codec (`protocols`),
//! which is kept apart from the tape format (`tape`). The two loops sit on
//! top: [`Recorder`] turns datagrams into frames, [`Player`] turns frames
//! back into datagrams. Both report progress through a [`ShowObserver`] and
//! stop cooperatively through a shared [`CancelToken`].
//!
//! Invariants:
//! - Tape records are always 516 bytes; a trailing partial record is ignored.
//! - Playback never drops or reorders frames, late ones are sent at once.
//! - A recording starts with the first payload that differs from the baseline.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use showtape_core::{
//!     CancelToken, Immediate, Player, ShowConfig, SystemClock, TapeReader, UdpSink,
//! };
//!
//! let config = ShowConfig::default();
//! let sink = UdpSink::connect(config.target)?;
//! let mut player = Player::new(config.playback(), sink, SystemClock::new(), CancelToken::new());
//! let tape = TapeReader::open(Path::new("bins/DMX-2024-05-01-20-00-00.bin"))?;
//! let outcome = player.play(tape, &mut Immediate, &mut ())?;
//! println!("sent {} frames", outcome.frames_sent);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cancel;
mod clock;
mod config;
mod events;
mod playback;
pub mod protocols;
mod recording;
mod sink;
mod source;
mod summary;
pub mod tape;

pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, SLEEP_SLICE, SystemClock};
pub use config::{
    ARTNET_PORT, ConfigError, DEFAULT_COUNTDOWN_S, DEFAULT_DURATION_S, DEFAULT_TAPE_DIR,
    PlaybackConfig, RecordingConfig, ShowConfig,
};
pub use events::{Immediate, PlaybackStatus, ShowEvent, ShowObserver, StartGate, StopReason};
pub use playback::{PlaybackError, PlaybackOutcome, PlaybackState, Player};
pub use protocols::artnet::{ArtNetError, ArtNetPacket, decode_packet, encode_packet};
pub use recording::{RecordError, Recorder, RecordingOutcome, RecordingState};
pub use sink::{DatagramSink, UdpSink};
pub use source::{Datagram, DatagramSource, PcapFileSource, SourceError, UdpSource};
pub use summary::{TapeSummary, summarize_reader, summarize_tape};
pub use tape::{
    DMX_SLOTS, FRAME_RECORD_SIZE, FrameError, LightingFrame, TapeDir, TapeError, TapeReader,
    TapeWriter, decode_frame, encode_frame,
};
