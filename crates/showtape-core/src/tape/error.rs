use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid channel buffer: expected {expected} slots, got {actual}")]
    InvalidChannelLength { expected: usize, actual: usize },
    #[error("short read: need {needed} bytes, got {actual}")]
    ShortRead { needed: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum TapeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot open tape {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot create tape in {dir}: {source}")]
    Create {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}
