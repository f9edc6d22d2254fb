pub const DMX_SLOTS: usize = 512;
pub const TIMESTAMP_LEN: usize = 4;

pub const TIMESTAMP_RANGE: std::ops::Range<usize> = 0..TIMESTAMP_LEN;
pub const CHANNELS_RANGE: std::ops::Range<usize> = TIMESTAMP_LEN..FRAME_RECORD_SIZE;

pub const FRAME_RECORD_SIZE: usize = TIMESTAMP_LEN + DMX_SLOTS;

pub const TAPE_EXTENSION: &str = "bin";
pub const TAPE_PREFIX: &str = "DMX-";
