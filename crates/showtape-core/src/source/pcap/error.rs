use thiserror::Error;

/// Failure reading a capture file as a whole.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot read capture: {0}")]
    Read(#[from] std::io::Error),
    #[error("malformed capture ({stage}): {message}")]
    Malformed {
        stage: &'static str,
        message: String,
    },
}

/// A single captured frame whose headers could not be sliced.
#[derive(Debug, Error)]
#[error("cannot slice captured frame: {0}")]
pub struct SliceError(pub String);
