//! Recording trigger and capture loop.
//!
//! The first ArtDMX packet for the configured universe becomes the
//! baseline. Recording begins with the first packet whose payload differs
//! from it byte for byte, length included. That packet is stored at
//! timestamp 0 and every later packet for the universe is stored at its
//! offset from the trigger, changed or not, padded to a full universe. The
//! frame that reaches the duration limit is still written.
//!
//! Each call to [`Recorder::record`] starts from a fresh baseline.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::config::RecordingConfig;
use crate::events::{ShowEvent, ShowObserver, StopReason};
use crate::protocols::artnet::decode_packet;
use crate::source::{DatagramSource, SourceError};
use crate::tape::{TapeDir, TapeError, TapeWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    WaitingForBaseline,
    WaitingForChange,
    Recording,
    Stopped,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("receive failed: {0}")]
    Source(#[from] SourceError),
    #[error("tape error: {0}")]
    Tape(#[from] TapeError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordingOutcome {
    /// No change was ever seen, so no file was created.
    NotStarted { reason: StopReason },
    Saved {
        path: PathBuf,
        frames: u64,
        /// Offset of the last written frame from the trigger.
        elapsed: Duration,
        reason: StopReason,
    },
}

struct Session {
    path: PathBuf,
    writer: TapeWriter<File>,
    trigger_at: Duration,
    elapsed: Duration,
}

pub struct Recorder {
    config: RecordingConfig,
    cancel: CancelToken,
    state: RecordingState,
}

impl Recorder {
    pub fn new(config: RecordingConfig, cancel: CancelToken) -> Self {
        Self {
            config,
            cancel,
            state: RecordingState::WaitingForBaseline,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Capture from `source` into a new tape under `dir`.
    ///
    /// The tape is closed on every exit path, including errors, so a partial
    /// recording stays readable. `RecordingStopped` is reported on every exit;
    /// when both the capture and closing the tape fail, the capture error is
    /// returned.
    pub fn record<S: DatagramSource + ?Sized>(
        &mut self,
        source: &mut S,
        dir: &TapeDir,
        observer: &mut dyn ShowObserver,
    ) -> Result<RecordingOutcome, RecordError> {
        self.state = RecordingState::WaitingForBaseline;
        let mut session = None;
        let captured = self.capture(source, dir, observer, &mut session);
        self.state = RecordingState::Stopped;

        let mut closed = None;
        let mut finished = Ok(());
        if let Some(session) = session {
            let frames = session.writer.frames_written();
            finished = session.writer.finish().map(drop);
            closed = Some((session.path, frames, session.elapsed));
        }
        let result = match (captured, finished) {
            (Ok(reason), Ok(())) => Ok(reason),
            (Ok(_), Err(err)) => Err(RecordError::from(err)),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(flush)) => {
                warn!("closing the tape also failed: {flush}");
                Err(err)
            }
        };
        let reason = match &result {
            Ok(reason) => *reason,
            Err(_) => StopReason::Failed,
        };
        observer.on_event(&ShowEvent::RecordingStopped { reason });
        let reason = result?;

        Ok(match closed {
            Some((path, frames, elapsed)) => {
                info!(
                    "saved {frames} frames ({:.3}s) to {}",
                    elapsed.as_secs_f64(),
                    path.display()
                );
                RecordingOutcome::Saved {
                    path,
                    frames,
                    elapsed,
                    reason,
                }
            }
            None => {
                info!("no change observed, nothing recorded");
                RecordingOutcome::NotStarted { reason }
            }
        })
    }

    fn capture<S: DatagramSource + ?Sized>(
        &mut self,
        source: &mut S,
        dir: &TapeDir,
        observer: &mut dyn ShowObserver,
        session: &mut Option<Session>,
    ) -> Result<StopReason, RecordError> {
        let mut baseline: Option<Vec<u8>> = None;

        loop {
            let Some(datagram) = source.next_datagram(&self.cancel)? else {
                return Ok(if self.cancel.is_cancelled() {
                    StopReason::Cancelled
                } else {
                    StopReason::SourceEnded
                });
            };
            let Some(packet) = decode_packet(&datagram.data) else {
                trace!("ignoring {} byte non-Art-Net datagram", datagram.data.len());
                continue;
            };
            if !packet.is_dmx_for(self.config.universe) {
                trace!(
                    "ignoring opcode {:#06x} universe {}",
                    packet.opcode, packet.universe
                );
                continue;
            }
            if packet.is_truncated() {
                debug!(
                    "short ArtDMX payload ({} slots), padding with zeros",
                    packet.payload.len()
                );
            }
            if session.is_none() {
                match &baseline {
                    None => {
                        baseline = Some(packet.payload.to_vec());
                        self.state = RecordingState::WaitingForChange;
                        observer.on_event(&ShowEvent::BaselineCaptured);
                        debug!("baseline captured on universe {}", self.config.universe);
                        continue;
                    }
                    Some(previous) if previous.as_slice() == packet.payload => continue,
                    Some(_) => {
                        let (path, file) = dir.create_tape()?;
                        info!("change detected, recording to {}", path.display());
                        self.state = RecordingState::Recording;
                        observer.on_event(&ShowEvent::RecordingStarted { path: path.clone() });
                        *session = Some(Session {
                            path,
                            writer: TapeWriter::new(file),
                            trigger_at: datagram.at,
                            elapsed: Duration::ZERO,
                        });
                    }
                }
            }
            let Some(active) = session.as_mut() else {
                continue;
            };

            let elapsed = datagram.at.saturating_sub(active.trigger_at);
            if elapsed < active.elapsed {
                warn!("receive time went backwards by {:?}", active.elapsed - elapsed);
            }
            active
                .writer
                .write_frame(elapsed.as_secs_f32(), &packet.slots())?;
            active.elapsed = elapsed;
            observer.on_event(&ShowEvent::FrameRecorded {
                count: active.writer.frames_written(),
                elapsed,
            });

            if elapsed >= self.config.duration {
                return Ok(StopReason::DurationReached);
            }
        }
    }
}
