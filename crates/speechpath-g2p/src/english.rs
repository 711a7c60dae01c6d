//! English G2P backed by a small trained-style lexicon, falling back to the
//! built-in heuristic word by word (not as a whole-list fallback — a single
//! unknown word shouldn't degrade the rest of the batch).

use std::collections::HashMap;

use crate::heuristic;
use crate::G2PBackend;

/// A handful of common entries standing in for a full CMU-style lexicon;
/// anything missing falls through to `heuristic::phonemes` per word.
pub struct EnglishBackend {
    lexicon: HashMap<String, Vec<String>>,
}

impl EnglishBackend {
    pub fn new() -> Self {
        let entries: &[(&str, &[&str])] = &[
            ("hello", &["HH", "AH", "L", "OW"]),
            ("water", &["W", "AO", "T", "ER"]),
            ("mother", &["M", "AH", "DH", "ER"]),
            ("father", &["F", "AA", "DH", "ER"]),
            ("bottle", &["B", "AA", "T", "AH", "L"]),
            ("rabbit", &["R", "AE", "B", "AH", "T"]),
        ];
        let lexicon = entries
            .iter()
            .map(|(w, p)| (w.to_string(), p.iter().map(|s| s.to_string()).collect()))
            .collect();
        Self { lexicon }
    }
}

impl Default for EnglishBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl G2PBackend for EnglishBackend {
    fn phonemes(&self, words: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        for w in words {
            let cleaned: String = w.to_lowercase().chars().filter(|c| c.is_alphabetic()).collect();
            match self.lexicon.get(&cleaned) {
                Some(entry) => out.extend(entry.iter().cloned()),
                None => out.extend(heuristic::phonemes(std::slice::from_ref(w))),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_hit_returns_trained_entry() {
        let backend = EnglishBackend::new();
        let result = backend.phonemes(&["hello".to_string()]);
        assert_eq!(result, vec!["HH", "AH", "L", "OW"]);
    }

    #[test]
    fn lexicon_miss_falls_through_per_word() {
        let backend = EnglishBackend::new();
        let result = backend.phonemes(&["cat".to_string(), "hello".to_string()]);
        assert_eq!(result, vec!["K", "AE", "T", "HH", "AH", "L", "OW"]);
    }
}
