//! Offline inspection of a tape.
//!
//! A single pass over the frames gathers timing statistics and the set of
//! channels that actually carry a cue. The summary is serialisable so the CLI
//! can emit it as JSON next to the tape.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tape::{DMX_SLOTS, TapeError, TapeReader};

/// Statistics for one tape.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use showtape_core::{encode_frame, summarize_reader, TapeReader};
///
/// let mut bytes = Vec::new();
/// bytes.extend_from_slice(&encode_frame(0.0, &[0u8; 512])?);
/// bytes.extend_from_slice(&encode_frame(0.5, &[255u8; 512])?);
///
/// let summary = summarize_reader(TapeReader::new(Cursor::new(bytes)))?;
/// assert_eq!(summary.frames, 2);
/// assert_eq!(summary.active_channels.len(), 512);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeSummary {
    /// Complete frame records.
    pub frames: u64,
    /// Timestamp of the last frame in seconds (0 for an empty tape).
    pub duration_s: f64,
    /// Bytes of a trailing partial record that were ignored.
    pub truncated_bytes: usize,
    /// Frames whose timestamp is lower than the previous one.
    pub non_monotonic: u64,
    /// Largest gap between consecutive timestamps, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_gap_s: Option<f64>,
    /// Average frame rate over the tape duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_fps: Option<f64>,
    /// 1-based channel numbers whose value changes at least once.
    pub active_channels: Vec<u16>,
}

pub fn summarize_tape(path: &Path) -> Result<TapeSummary, TapeError> {
    summarize_reader(TapeReader::open(path)?)
}

pub fn summarize_reader<R: Read>(mut tape: TapeReader<R>) -> Result<TapeSummary, TapeError> {
    let mut frames = 0u64;
    let mut non_monotonic = 0u64;
    let mut max_gap: Option<f64> = None;
    let mut first: Option<[u8; DMX_SLOTS]> = None;
    let mut changed = [false; DMX_SLOTS];
    let mut previous_ts: Option<f64> = None;
    let mut last_ts = 0.0f64;

    while let Some(frame) = tape.next_frame()? {
        frames += 1;
        let ts = f64::from(frame.timestamp);
        if let Some(prev) = previous_ts {
            let gap = ts - prev;
            if gap < 0.0 {
                non_monotonic += 1;
            } else if max_gap.is_none_or(|max| gap > max) {
                max_gap = Some(gap);
            }
        }
        previous_ts = Some(ts);
        last_ts = ts;

        match &first {
            None => first = Some(frame.channels),
            Some(reference) => {
                for (slot, flag) in changed.iter_mut().enumerate() {
                    *flag |= frame.channels[slot] != reference[slot];
                }
            }
        }
    }

    let duration_s = if last_ts.is_finite() { last_ts.max(0.0) } else { 0.0 };
    let mean_fps = (frames > 1 && duration_s > 0.0).then(|| frames as f64 / duration_s);
    let active_channels = changed
        .iter()
        .enumerate()
        .filter(|(_, flag)| **flag)
        .map(|(slot, _)| slot as u16 + 1)
        .collect();

    Ok(TapeSummary {
        frames,
        duration_s,
        truncated_bytes: tape.truncated_bytes(),
        non_monotonic,
        max_gap_s: max_gap,
        mean_fps,
        active_channels,
    })
}
