//! Grapheme-to-phoneme resolution for the speech-therapy worker.
//!
//! Five backends share one trait: a trained English lexicon, two
//! external-binary adapters (Phonetisaurus- and Sequitur-style), and
//! character maps for Persian and German that bypass the cache and the
//! trained backends entirely. [`routing::multilingual_g2p`] is the single
//! entry point a worker calls.

mod cache;
mod english;
mod external;
mod german;
mod heuristic;
mod persian;
mod routing;

pub use cache::{resolve_for_child, G2PCache, NoopCache};
pub use english::EnglishBackend;
pub use external::{ExternalBinaryBackend, ExternalVariant};
pub use routing::{multilingual_g2p, multilingual_g2p_stateless, resolve_backend, G2PBackendKind};

/// A backend that turns a word list into a flat phoneme sequence.
///
/// Infallible by design: every implementation degrades to the built-in
/// heuristic internally rather than returning an error, so callers never
/// need a fallback branch of their own.
pub trait G2PBackend: Send + Sync {
    fn phonemes(&self, words: &[String]) -> Vec<String>;
}
