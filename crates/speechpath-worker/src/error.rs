//! Worker-wide error taxonomy.
//!
//! The message loop inspects the variant to decide completion vs.
//! abandonment rather than string-matching on a message; non-fatal errors
//! (G2P cache misses, drift bookkeeping) never reach this type — they are
//! logged and swallowed at their origin.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("invalid submission payload: {0}")]
    Validation(#[from] speechpath_types::ValidationError),

    #[error("audio fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("audio decode failed: {0}")]
    Decode(#[from] speechpath_audio::DecodeError),

    #[error("inference failed: {0}")]
    Inference(anyhow::Error),

    #[error("persistence failed: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl WorkerError {
    /// Whether this variant should increment `errors_total`. Every variant
    /// reaching this type does — only the non-fatal paths bypass it
    /// entirely by never constructing one.
    pub fn is_fatal(&self) -> bool {
        true
    }
}
