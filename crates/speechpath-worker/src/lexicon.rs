//! Per-child target lexicon resolution.
//!
//! Canonical order (see DESIGN.md's Open Question decisions): the
//! child-specific lexicon is tried first; the process-wide default is only
//! consulted when that lookup yields nothing. A single alignment pass uses
//! whichever list comes back.

use async_trait::async_trait;
use speechpath_g2p::{multilingual_g2p, G2PBackend, G2PCache};

#[async_trait]
pub trait LexiconStore: Send + Sync {
    async fn fetch(&self, child_id: &str) -> Option<ChildLexiconRow>;
}

#[derive(Clone)]
pub struct ChildLexiconRow {
    pub phonemes: Option<Vec<String>>,
    pub words: Option<Vec<String>>,
}

/// Resolve one child's expected phoneme sequence: a stored phoneme list
/// wins outright; stored words are routed through G2P; anything else (a
/// missing row, a store error already swallowed by the implementation)
/// yields an empty list.
pub async fn fetch_child_lexicon(
    store: &dyn LexiconStore,
    cache: &dyn G2PCache,
    backend: &dyn G2PBackend,
    child_id: &str,
    lang: &str,
) -> Vec<String> {
    let Some(row) = store.fetch(child_id).await else {
        return Vec::new();
    };
    if let Some(phonemes) = row.phonemes.filter(|p| !p.is_empty()) {
        return phonemes;
    }
    if let Some(words) = row.words {
        return multilingual_g2p(cache, backend, &words, child_id, lang).await;
    }
    Vec::new()
}

/// Child-specific lexicon first, process-wide default as the sole fallback.
pub async fn resolve_target_lexicon(
    store: &dyn LexiconStore,
    cache: &dyn G2PCache,
    backend: &dyn G2PBackend,
    child_id: &str,
    lang: &str,
    default_lexicon: &[String],
) -> Vec<String> {
    let child_specific = fetch_child_lexicon(store, cache, backend, child_id, lang).await;
    if !child_specific.is_empty() {
        child_specific
    } else {
        default_lexicon.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speechpath_g2p::{EnglishBackend, NoopCache};

    struct FakeStore(Option<ChildLexiconRow>);

    #[async_trait]
    impl LexiconStore for FakeStore {
        async fn fetch(&self, _child_id: &str) -> Option<ChildLexiconRow> {
            match &self.0 {
                Some(row) => Some(ChildLexiconRow {
                    phonemes: row.phonemes.clone(),
                    words: row.words.clone(),
                }),
                None => None,
            }
        }
    }

    #[tokio::test]
    async fn stored_phonemes_win_outright() {
        let store = FakeStore(Some(ChildLexiconRow {
            phonemes: Some(vec!["K".into(), "AE".into(), "T".into()]),
            words: Some(vec!["dog".into()]),
        }));
        let cache = NoopCache;
        let backend = EnglishBackend::new();
        let result = fetch_child_lexicon(&store, &cache, &backend, "c1", "auto").await;
        assert_eq!(result, vec!["K", "AE", "T"]);
    }

    #[tokio::test]
    async fn missing_row_falls_back_to_default() {
        let store = FakeStore(None);
        let cache = NoopCache;
        let backend = EnglishBackend::new();
        let default = vec!["S".to_string()];
        let result = resolve_target_lexicon(&store, &cache, &backend, "c1", "auto", &default).await;
        assert_eq!(result, default);
    }

    #[tokio::test]
    async fn empty_words_list_yields_empty_lexicon() {
        let store = FakeStore(Some(ChildLexiconRow {
            phonemes: None,
            words: None,
        }));
        let cache = NoopCache;
        let backend = EnglishBackend::new();
        let result = fetch_child_lexicon(&store, &cache, &backend, "c1", "auto").await;
        assert!(result.is_empty());
    }
}
