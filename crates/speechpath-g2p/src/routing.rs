//! Top-level entry point: language routing, then per-child cache resolution
//! for the default language.

use crate::cache::{resolve_for_child, G2PCache};
use crate::external::{ExternalBinaryBackend, ExternalVariant};
use crate::english::EnglishBackend;
use crate::{german, heuristic, persian, G2PBackend};

/// Which trained backend a worker is configured to use for the default
/// (English) language path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum G2PBackendKind {
    English,
    Phonetisaurus { bin_path: String, model_path: Option<String> },
    Sequitur { bin_path: String, model_path: Option<String> },
}

/// Build the configured backend. Always succeeds: external-binary variants
/// degrade to the heuristic internally rather than failing at construction.
pub fn resolve_backend(kind: G2PBackendKind) -> Box<dyn G2PBackend> {
    match kind {
        G2PBackendKind::English => Box::new(EnglishBackend::new()),
        G2PBackendKind::Phonetisaurus { bin_path, model_path } => {
            Box::new(ExternalBinaryBackend::new(ExternalVariant::Phonetisaurus, bin_path, model_path))
        }
        G2PBackendKind::Sequitur { bin_path, model_path } => {
            Box::new(ExternalBinaryBackend::new(ExternalVariant::Sequitur, bin_path, model_path))
        }
    }
}

/// Route a word list to the right G2P path by language code.
///
/// `fa` and `de` go straight to their character maps and never touch the
/// cache or the configured default backend. Everything else resolves through
/// the per-child cache against `default_backend`, matching the source's
/// `auto` behavior.
pub async fn multilingual_g2p(
    cache: &dyn G2PCache,
    default_backend: &dyn G2PBackend,
    words: &[String],
    child_id: &str,
    lang: &str,
) -> Vec<String> {
    match lang.to_lowercase().as_str() {
        "fa" => persian::phonemes(words),
        "de" => german::phonemes(words),
        _ => resolve_for_child(cache, default_backend, child_id, words).await,
    }
}

/// Stateless equivalent of [`multilingual_g2p`] for when no child id or
/// cache is available: skips the cache entirely and calls the backend
/// directly, same as the source's uncached path.
pub fn multilingual_g2p_stateless(default_backend: &dyn G2PBackend, words: &[String], lang: &str) -> Vec<String> {
    match lang.to_lowercase().as_str() {
        "fa" => persian::phonemes(words),
        "de" => german::phonemes(words),
        _ => {
            let words: Vec<String> = words.iter().filter(|w| !w.trim().is_empty()).cloned().collect();
            if words.is_empty() {
                heuristic::phonemes(&[])
            } else {
                default_backend.phonemes(&words)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NoopCache;

    #[test]
    fn persian_route_bypasses_backend() {
        let backend = EnglishBackend::new();
        let result = multilingual_g2p_stateless(&backend, &["با".to_string()], "fa");
        assert_eq!(result, vec!["B", "AA"]);
    }

    #[test]
    fn german_route_bypasses_backend() {
        let backend = EnglishBackend::new();
        let result = multilingual_g2p_stateless(&backend, &["ja".to_string()], "de");
        assert_eq!(result, vec!["JH", "AA"]);
    }

    #[tokio::test]
    async fn default_route_uses_cache() {
        let cache = NoopCache;
        let backend = EnglishBackend::new();
        let result = multilingual_g2p(&cache, &backend, &["hello".to_string()], "child1", "auto").await;
        assert_eq!(result, vec!["HH", "AH", "L", "OW"]);
    }

    #[test]
    fn resolve_backend_never_fails_for_missing_model() {
        let backend = resolve_backend(G2PBackendKind::Phonetisaurus {
            bin_path: "phonetisaurus-g2p".to_string(),
            model_path: None,
        });
        let result = backend.phonemes(&["cat".to_string()]);
        assert_eq!(result, vec!["K", "AE", "T"]);
    }
}
