//! Operator-facing glue: progress output, the ENTER prompt, Ctrl+C and the
//! optional cue commands (background audio, countdown tick, stop sound).

use std::io::{self, BufRead};
use std::process::{Child, Command};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use showtape_core::{CancelToken, PlaybackStatus, ShowEvent, ShowObserver, StartGate, StopReason};

const PROMPT_POLL: Duration = Duration::from_millis(100);

/// Cancel `token` on the first Ctrl+C.
///
/// The signal is awaited on a dedicated thread so the capture and playback
/// loops stay synchronous.
pub fn cancel_on_interrupt(token: CancelToken) -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("interrupt received, stopping");
                        token.cancel();
                    }
                    Err(err) => warn!("cannot listen for Ctrl+C: {err}"),
                }
            });
        })?;
    Ok(())
}

/// Waits for a line on stdin. End of input means "do not start".
pub struct EnterGate;

impl StartGate for EnterGate {
    fn wait_for_start(&mut self, cancel: &CancelToken) -> io::Result<bool> {
        eprintln!("Fixtures are at the first cue. Press ENTER to start (Ctrl+C to abort).");
        let (tx, rx) = mpsc::channel();
        // A blocked stdin read cannot be interrupted, so it runs detached.
        thread::spawn(move || {
            let mut line = String::new();
            let _ = tx.send(io::stdin().lock().read_line(&mut line));
        });
        loop {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            match rx.recv_timeout(PROMPT_POLL) {
                Ok(Ok(0)) => return Ok(false),
                Ok(Ok(_)) => return Ok(true),
                Ok(Err(err)) => return Err(err),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Ok(false),
            }
        }
    }
}

/// External program (typically an audio player) run for the duration of
/// timed playback.
struct CueCommand {
    command: String,
    child: Option<Child>,
}

impl CueCommand {
    fn new(command: String) -> Self {
        Self {
            command,
            child: None,
        }
    }

    fn start(&mut self) {
        match shell(&self.command).spawn() {
            Ok(child) => {
                debug!("cue command started (pid {})", child.id());
                self.child = Some(child);
            }
            Err(err) => warn!("cannot start cue command `{}`: {err}", self.command),
        }
    }

    fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Ok(Some(status)) = child.try_wait() {
            debug!("cue command already exited ({status})");
            return;
        }
        if let Err(err) = child.kill() {
            warn!("cannot stop cue command: {err}");
        }
        let _ = child.wait();
    }
}

impl Drop for CueCommand {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Short commands fired on a cue point (metronome tick, stop sound).
///
/// Each run is detached from playback timing; the children are reaped when
/// the console is dropped so a stop sound is not cut off at exit.
#[derive(Default)]
struct OneShots {
    running: Vec<Child>,
}

impl OneShots {
    fn fire(&mut self, label: &str, command: &str) {
        self.running.retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
        match shell(command).spawn() {
            Ok(child) => {
                debug!("{label} command started (pid {})", child.id());
                self.running.push(child);
            }
            Err(err) => warn!("cannot start {label} command `{command}`: {err}"),
        }
    }
}

impl Drop for OneShots {
    fn drop(&mut self) {
        for mut child in self.running.drain(..) {
            let _ = child.wait();
        }
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

/// Shell commands bound to playback cue points.
#[derive(Debug, Default)]
pub struct Cues {
    /// Runs for the length of timed playback.
    pub background: Option<String>,
    /// Fired on every countdown tick.
    pub tick: Option<String>,
    /// Fired once when playback stops after the pre-roll.
    pub stop: Option<String>,
}

/// Logs show events and drives the cue commands.
#[derive(Default)]
pub struct Console {
    background: Option<CueCommand>,
    tick: Option<String>,
    stop: Option<String>,
    one_shots: OneShots,
}

impl Console {
    pub fn with_cues(cues: Cues) -> Self {
        Self {
            background: cues.background.map(CueCommand::new),
            tick: cues.tick,
            stop: cues.stop,
            one_shots: OneShots::default(),
        }
    }
}

impl ShowObserver for Console {
    fn on_event(&mut self, event: &ShowEvent) {
        match event {
            ShowEvent::PrerollSent => info!("pre-roll frame sent"),
            ShowEvent::CountdownTick { remaining } => {
                info!("{remaining}...");
                if let Some(tick) = &self.tick {
                    self.one_shots.fire("tick", tick);
                }
            }
            ShowEvent::PlaybackStarted => {
                info!("playing");
                if let Some(cue) = self.background.as_mut() {
                    cue.start();
                }
            }
            ShowEvent::FrameSent { index, timestamp } => {
                debug!("frame {index} at {timestamp:.3}s")
            }
            ShowEvent::PlaybackStopped { status } => {
                if let Some(cue) = self.background.as_mut() {
                    cue.stop();
                }
                if let Some(stop) = &self.stop {
                    self.one_shots.fire("stop", stop);
                }
                match status {
                    PlaybackStatus::Completed => info!("playback complete"),
                    PlaybackStatus::StoppedEarly => info!("playback stopped early"),
                    PlaybackStatus::Aborted => info!("playback aborted before start"),
                }
            }
            ShowEvent::BaselineCaptured => info!("baseline captured, waiting for the first change"),
            ShowEvent::RecordingStarted { path } => info!("recording -> {}", path.display()),
            ShowEvent::FrameRecorded { count, elapsed } => {
                if count % 100 == 0 {
                    info!("{count} frames, {:.1}s", elapsed.as_secs_f64());
                }
            }
            ShowEvent::RecordingStopped { reason } => match reason {
                StopReason::DurationReached => info!("duration reached"),
                StopReason::Cancelled => info!("recording interrupted"),
                StopReason::SourceEnded => info!("input exhausted"),
                StopReason::Failed => warn!("recording failed"),
            },
        }
    }
}
