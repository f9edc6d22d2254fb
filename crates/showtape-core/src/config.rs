//! Startup configuration shared by the pacer and the capture loop.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard Art-Net UDP port.
pub const ARTNET_PORT: u16 = 6454;
pub const DEFAULT_DURATION_S: f64 = 225.0;
pub const DEFAULT_COUNTDOWN_S: u32 = 3;
pub const DEFAULT_TAPE_DIR: &str = "bins";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Configuration file contents. Every field is optional.
///
/// # Examples
/// ```
/// use showtape_core::ShowConfig;
///
/// let config: ShowConfig = serde_json::from_str(r#"{ "universe": 2 }"#).unwrap();
/// assert_eq!(config.universe, 2);
/// assert_eq!(config.target.port(), 6454);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShowConfig {
    /// Destination of played-back packets.
    pub target: SocketAddr,
    /// Local address the recorder listens on.
    pub listen: SocketAddr,
    /// Universe recorded from and played back to.
    pub universe: u16,
    /// Recording stops once this many seconds have elapsed since the trigger.
    pub duration_s: f64,
    /// Seconds of countdown between the start signal and playback.
    pub countdown_s: u32,
    /// Directory new tapes are written to.
    pub tape_dir: PathBuf,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::from(([255, 255, 255, 255], ARTNET_PORT)),
            listen: SocketAddr::from(([0, 0, 0, 0], ARTNET_PORT)),
            universe: 0,
            duration_s: DEFAULT_DURATION_S,
            countdown_s: DEFAULT_COUNTDOWN_S,
            tape_dir: PathBuf::from(DEFAULT_TAPE_DIR),
        }
    }
}

impl ShowConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ShowConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.duration_s.is_finite() || self.duration_s < 0.0 {
            return Err(ConfigError::Invalid {
                field: "duration_s",
                reason: format!(
                    "expected a non-negative number of seconds, got {}",
                    self.duration_s
                ),
            });
        }
        Ok(())
    }

    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            universe: self.universe,
            countdown: self.countdown_s,
        }
    }

    pub fn recording(&self) -> Result<RecordingConfig, ConfigError> {
        self.validate()?;
        let duration =
            Duration::try_from_secs_f64(self.duration_s).map_err(|err| ConfigError::Invalid {
                field: "duration_s",
                reason: err.to_string(),
            })?;
        Ok(RecordingConfig {
            universe: self.universe,
            duration,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub universe: u16,
    /// Countdown ticks (one per second) before timed playback; 0 disables.
    pub countdown: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        ShowConfig::default().playback()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingConfig {
    pub universe: u16,
    pub duration: Duration,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            universe: 0,
            duration: Duration::from_secs_f64(DEFAULT_DURATION_S),
        }
    }
}
