//! Per-child write-through phoneme cache.
//!
//! The cache itself is a trait so this crate stays free of a database
//! dependency; `speechpath-worker` supplies the `sqlx`-backed implementation
//! against `child_g2p_cache`. A cache that errors internally should log and
//! return an empty lookup/no-op store rather than propagate — a cache miss
//! must never block a resolution that the backend can still answer.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::G2PBackend;

#[async_trait]
pub trait G2PCache: Send + Sync {
    async fn lookup(&self, child_id: &str, words: &[String]) -> HashMap<String, Vec<String>>;
    async fn store(&self, child_id: &str, mapping: &HashMap<String, Vec<String>>);
}

/// A cache that never has anything cached; used when no child id is given
/// or when the worker is configured without persistence.
pub struct NoopCache;

#[async_trait]
impl G2PCache for NoopCache {
    async fn lookup(&self, _child_id: &str, _words: &[String]) -> HashMap<String, Vec<String>> {
        HashMap::new()
    }

    async fn store(&self, _child_id: &str, _mapping: &HashMap<String, Vec<String>>) {}
}

/// Spread a backend's flat phoneme list across the words that missed cache:
/// each word gets `ceil(len(phonemes) / len(words))` phonemes, except the
/// last word, which takes whatever remains. The concatenation of all
/// per-word slices is always exactly `phonemes`.
fn distribute(phonemes: Vec<String>, words: &[String]) -> HashMap<String, Vec<String>> {
    let mut mapping = HashMap::new();
    if words.is_empty() {
        return mapping;
    }
    let per_word = (phonemes.len() + words.len() - 1) / words.len();
    let mut idx = 0;
    for (i, w) in words.iter().enumerate() {
        let end = if i == words.len() - 1 { phonemes.len() } else { (idx + per_word).min(phonemes.len()) };
        let slice = if idx < end { phonemes[idx..end].to_vec() } else { Vec::new() };
        mapping.insert(w.clone(), slice);
        idx = end;
    }
    mapping
}

/// Resolve phonemes for `words` for a specific child: cache hits are reused
/// as-is, misses go to `backend` and the result is distributed and written
/// back through the cache. Blank words are dropped before lookup.
pub async fn resolve_for_child(
    cache: &dyn G2PCache,
    backend: &dyn G2PBackend,
    child_id: &str,
    words: &[String],
) -> Vec<String> {
    let words: Vec<String> = words.iter().filter(|w| !w.trim().is_empty()).cloned().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let cached = cache.lookup(child_id, &words).await;
    let miss: Vec<String> = words.iter().filter(|w| !cached.contains_key(*w)).cloned().collect();

    let mut mapping = cached;
    if !miss.is_empty() {
        let flat = backend.phonemes(&miss);
        let distributed = distribute(flat, &miss);
        mapping.extend(distributed.clone());
        cache.store(child_id, &distributed).await;
    }

    words.iter().flat_map(|w| mapping.get(w).cloned().unwrap_or_default()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic;
    use std::sync::Mutex;

    struct FakeBackend;
    impl G2PBackend for FakeBackend {
        fn phonemes(&self, words: &[String]) -> Vec<String> {
            heuristic::phonemes(words)
        }
    }

    struct InMemoryCache {
        store: Mutex<HashMap<(String, String), Vec<String>>>,
    }

    impl InMemoryCache {
        fn new() -> Self {
            Self {
                store: Mutex::new(HashMap::new()),
            }
        }

        fn seed(&self, child_id: &str, word: &str, phonemes: Vec<String>) {
            self.store
                .lock()
                .unwrap()
                .insert((child_id.to_string(), word.to_string()), phonemes);
        }
    }

    #[async_trait]
    impl G2PCache for InMemoryCache {
        async fn lookup(&self, child_id: &str, words: &[String]) -> HashMap<String, Vec<String>> {
            let store = self.store.lock().unwrap();
            words
                .iter()
                .filter_map(|w| {
                    store
                        .get(&(child_id.to_string(), w.clone()))
                        .map(|p| (w.clone(), p.clone()))
                })
                .collect()
        }

        async fn store(&self, child_id: &str, mapping: &HashMap<String, Vec<String>>) {
            let mut store = self.store.lock().unwrap();
            for (w, p) in mapping {
                store.insert((child_id.to_string(), w.clone()), p.clone());
            }
        }
    }

    #[tokio::test]
    async fn cache_hit_skips_backend() {
        let cache = InMemoryCache::new();
        cache.seed("child1", "cat", vec!["K".into(), "AE".into(), "T".into()]);
        let backend = FakeBackend;
        let result = resolve_for_child(&cache, &backend, "child1", &["cat".to_string()]).await;
        assert_eq!(result, vec!["K", "AE", "T"]);
    }

    #[tokio::test]
    async fn cache_miss_is_resolved_and_stored() {
        let cache = InMemoryCache::new();
        let backend = FakeBackend;
        let result = resolve_for_child(&cache, &backend, "child1", &["dog".to_string()]).await;
        assert_eq!(result, vec!["D", "AO", "G"]);
        let recached = cache.lookup("child1", &["dog".to_string()]).await;
        assert!(recached.contains_key("dog"));
    }

    #[tokio::test]
    async fn blank_words_are_dropped() {
        let cache = InMemoryCache::new();
        let backend = FakeBackend;
        let result = resolve_for_child(&cache, &backend, "child1", &["  ".to_string()]).await;
        assert!(result.is_empty());
    }

    #[test]
    fn distribute_uses_ceiling_and_last_word_takes_remainder() {
        let phonemes: Vec<String> = vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]
            .into_iter()
            .map(String::from)
            .collect();
        let words = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mapping = distribute(phonemes, &words);
        // ceil(10/3) = 4 per word, last word takes the remainder.
        assert_eq!(mapping.get("a").unwrap().len(), 4);
        assert_eq!(mapping.get("b").unwrap().len(), 4);
        assert_eq!(mapping.get("c").unwrap().len(), 2);
        let total: usize = mapping.values().map(|v| v.len()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn distribute_gives_trailing_words_empty_slices_when_fewer_phonemes_than_words() {
        let phonemes = vec!["K".to_string(), "AE".to_string(), "T".to_string()];
        let words = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        let mapping = distribute(phonemes, &words);
        // ceil(3/4) = 1 per word; the fourth word gets nothing, not a fallback.
        assert_eq!(mapping.get("a").unwrap().len(), 1);
        assert_eq!(mapping.get("b").unwrap().len(), 1);
        assert_eq!(mapping.get("c").unwrap().len(), 1);
        assert_eq!(mapping.get("d").unwrap(), &Vec::<String>::new());
    }
}
