//! Protocol codecs.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets and ranges (source of truth)
//! - `reader`: safe byte access and protocol conventions
//! - `parser` / `writer`: domain-level decoding and encoding
//! - `error`: explicit, actionable errors
//!
//! Codecs are pure and contain no I/O.

pub mod artnet;
