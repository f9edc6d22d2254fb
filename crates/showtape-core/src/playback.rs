//! Playback pacer: re-transmits a tape at its recorded offsets.
//!
//! Sequence: `Idle -> Preparing -> Countdown -> Playing -> Finished`.
//!
//! - Preparing: the first frame is sent once, untimed, so fixtures can move
//!   into position, then the start gate blocks until the operator is ready.
//! - Countdown: one tick per second, purely cosmetic.
//! - Playing: `t0` is taken and every frame (the first one included) is sent
//!   when `now - t0` reaches its timestamp. A frame that is already late is
//!   sent at once; frames are never dropped or duplicated to catch up.
//!
//! Cancellation is observed at every sleep. Once it fires no further
//! datagram is sent.

use std::io::{self, Read};
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::clock::Clock;
use crate::config::PlaybackConfig;
use crate::events::{PlaybackStatus, ShowEvent, ShowObserver, StartGate};
use crate::protocols::artnet::{ArtNetError, encode_packet};
use crate::sink::DatagramSink;
use crate::tape::{LightingFrame, TapeError, TapeReader};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Preparing,
    Countdown,
    Playing,
    Finished,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("tape error: {0}")]
    Tape(#[from] TapeError),
    #[error("Art-Net encoding failed: {0}")]
    Encode(#[from] ArtNetError),
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
    #[error("start signal failed: {0}")]
    Gate(#[source] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackOutcome {
    pub status: PlaybackStatus,
    /// Whether the untimed pre-roll frame went out.
    pub preroll_sent: bool,
    /// Timed frames sent (the pre-roll is not counted).
    pub frames_sent: u64,
    pub last_timestamp: Option<f32>,
    /// Bytes of a partial record dropped from the end of the tape.
    pub truncated_bytes: usize,
}

impl Default for PlaybackOutcome {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Completed,
            preroll_sent: false,
            frames_sent: 0,
            last_timestamp: None,
            truncated_bytes: 0,
        }
    }
}

pub struct Player<S, C> {
    config: PlaybackConfig,
    sink: S,
    clock: C,
    cancel: CancelToken,
    state: PlaybackState,
}

impl<S: DatagramSink, C: Clock> Player<S, C> {
    pub fn new(config: PlaybackConfig, sink: S, clock: C, cancel: CancelToken) -> Self {
        Self {
            config,
            sink,
            clock,
            cancel,
            state: PlaybackState::Idle,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Play `tape` to completion, cancellation, or the first error.
    ///
    /// `PlaybackStopped` is reported on every exit path once the pre-roll
    /// has been sent. An empty tape sends nothing.
    pub fn play<R: Read>(
        &mut self,
        mut tape: TapeReader<R>,
        gate: &mut dyn StartGate,
        observer: &mut dyn ShowObserver,
    ) -> Result<PlaybackOutcome, PlaybackError> {
        self.state = PlaybackState::Preparing;
        let mut outcome = PlaybackOutcome::default();
        let result = self.run(&mut tape, gate, observer, &mut outcome);
        self.state = PlaybackState::Finished;

        outcome.truncated_bytes = tape.truncated_bytes();
        outcome.status = match &result {
            Ok(status) => *status,
            Err(_) => PlaybackStatus::StoppedEarly,
        };
        if outcome.preroll_sent {
            observer.on_event(&ShowEvent::PlaybackStopped {
                status: outcome.status,
            });
        }
        info!(
            "playback finished ({:?}): {} frames sent",
            outcome.status, outcome.frames_sent
        );
        result.map(|_| outcome)
    }

    fn run<R: Read>(
        &mut self,
        tape: &mut TapeReader<R>,
        gate: &mut dyn StartGate,
        observer: &mut dyn ShowObserver,
        outcome: &mut PlaybackOutcome,
    ) -> Result<PlaybackStatus, PlaybackError> {
        let Some(first) = tape.next_frame()? else {
            info!("tape is empty, nothing to play");
            return Ok(PlaybackStatus::Completed);
        };
        if self.cancel.is_cancelled() {
            return Ok(PlaybackStatus::StoppedEarly);
        }

        self.transmit(&first)?;
        outcome.preroll_sent = true;
        observer.on_event(&ShowEvent::PrerollSent);
        debug!("pre-roll sent on universe {}", self.config.universe);

        let ready = gate
            .wait_for_start(&self.cancel)
            .map_err(PlaybackError::Gate)?;
        if self.cancel.is_cancelled() {
            return Ok(PlaybackStatus::StoppedEarly);
        }
        if !ready {
            return Ok(PlaybackStatus::Aborted);
        }

        self.state = PlaybackState::Countdown;
        for remaining in (1..=self.config.countdown).rev() {
            observer.on_event(&ShowEvent::CountdownTick { remaining });
            if !self.clock.sleep(COUNTDOWN_TICK, &self.cancel) {
                return Ok(PlaybackStatus::StoppedEarly);
            }
        }

        self.state = PlaybackState::Playing;
        observer.on_event(&ShowEvent::PlaybackStarted);
        let t0 = self.clock.now();

        let mut next = Some(first);
        while let Some(frame) = next {
            if self.cancel.is_cancelled() {
                return Ok(PlaybackStatus::StoppedEarly);
            }
            let target = frame_offset(frame.timestamp);
            let elapsed = self.clock.now().saturating_sub(t0);
            match target.checked_sub(elapsed) {
                Some(wait) if !wait.is_zero() => {
                    if !self.clock.sleep(wait, &self.cancel) {
                        return Ok(PlaybackStatus::StoppedEarly);
                    }
                }
                _ => {
                    if elapsed > target {
                        debug!(
                            "frame at {:.3}s is {:?} late",
                            frame.timestamp,
                            elapsed - target
                        );
                    }
                }
            }

            self.transmit(&frame)?;
            observer.on_event(&ShowEvent::FrameSent {
                index: outcome.frames_sent,
                timestamp: frame.timestamp,
            });
            outcome.frames_sent += 1;
            outcome.last_timestamp = Some(frame.timestamp);

            next = tape.next_frame()?;
        }

        Ok(PlaybackStatus::Completed)
    }

    fn transmit(&mut self, frame: &LightingFrame) -> Result<(), PlaybackError> {
        let packet = encode_packet(self.config.universe, &frame.channels)?;
        self.sink.send(&packet).map_err(PlaybackError::Send)
    }
}

/// Offset from playback start for a stored timestamp. Negative, NaN and
/// unrepresentable values play immediately.
fn frame_offset(timestamp: f32) -> Duration {
    if timestamp.is_finite() && timestamp > 0.0 {
        Duration::try_from_secs_f32(timestamp).unwrap_or(Duration::ZERO)
    } else {
        Duration::ZERO
    }
}
