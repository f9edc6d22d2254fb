//! Notifications emitted by the pacer and the capture loop.
//!
//! Observers drive cues (metronome, background audio) and progress output.
//! The loops never read anything back from an observer.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::cancel::CancelToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Every frame on the tape was sent.
    Completed,
    /// Interrupted after playback was armed.
    StoppedEarly,
    /// The operator declined to start.
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    DurationReached,
    Cancelled,
    SourceEnded,
    /// Receiving or writing failed; the error is returned to the caller.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShowEvent {
    PrerollSent,
    CountdownTick { remaining: u32 },
    PlaybackStarted,
    FrameSent { index: u64, timestamp: f32 },
    PlaybackStopped { status: PlaybackStatus },
    BaselineCaptured,
    RecordingStarted { path: PathBuf },
    FrameRecorded { count: u64, elapsed: Duration },
    RecordingStopped { reason: StopReason },
}

pub trait ShowObserver {
    fn on_event(&mut self, event: &ShowEvent);
}

impl ShowObserver for () {
    fn on_event(&mut self, _event: &ShowEvent) {}
}

impl ShowObserver for Vec<ShowEvent> {
    fn on_event(&mut self, event: &ShowEvent) {
        self.push(event.clone());
    }
}

/// Blocks playback between pre-roll and countdown until the operator is ready.
pub trait StartGate {
    /// `Ok(false)` means the operator chose not to start.
    fn wait_for_start(&mut self, cancel: &CancelToken) -> io::Result<bool>;
}

/// Gate that opens at once unless cancellation is already pending.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl StartGate for Immediate {
    fn wait_for_start(&mut self, cancel: &CancelToken) -> io::Result<bool> {
        Ok(!cancel.is_cancelled())
    }
}
