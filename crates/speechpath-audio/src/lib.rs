//! Audio decoding for the speech-therapy inference worker.
//!
//! Takes the raw bytes fetched from a submission's blob URL and produces a
//! mono [`Waveform`] at the file's native sample rate. No capture, no
//! resampling, no recording — those belong to the desktop client this
//! worker receives submissions from, not to the worker itself.

pub mod waveform;

pub use waveform::{decode, DecodeError, Waveform};
