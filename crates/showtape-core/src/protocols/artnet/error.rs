use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtNetError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid channel buffer: expected {expected} slots, got {actual}")]
    InvalidChannelLength { expected: usize, actual: usize },
}
