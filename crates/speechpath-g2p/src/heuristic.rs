//! Built-in grapheme-to-phoneme fallback: a tiny hand-built lexicon plus a
//! per-letter vowel/consonant heuristic for anything not in it.
//!
//! Every other backend in this crate falls through to this one when it
//! cannot produce an answer, so it must never fail.

fn base_lexicon(word: &str) -> Option<&'static [&'static str]> {
    match word {
        "cat" => Some(&["K", "AE", "T"]),
        "dog" => Some(&["D", "AO", "G"]),
        "mama" => Some(&["M", "AA", "M", "AA"]),
        "papa" => Some(&["P", "AA", "P", "AA"]),
        "car" => Some(&["K", "AA", "R"]),
        "ball" => Some(&["B", "AO", "L"]),
        _ => None,
    }
}

fn vowel(ch: char) -> Option<&'static str> {
    match ch {
        'a' => Some("AH"),
        'e' => Some("EH"),
        'i' => Some("IH"),
        'o' => Some("AO"),
        'u' => Some("UH"),
        _ => None,
    }
}

fn consonant(ch: char) -> &'static str {
    match ch {
        'b' => "B",
        'c' => "K",
        'd' => "D",
        'f' => "F",
        'g' => "G",
        'h' => "HH",
        'j' => "JH",
        'k' => "K",
        'l' => "L",
        'm' => "M",
        'n' => "N",
        'p' => "P",
        'q' => "K",
        'r' => "R",
        's' => "S",
        't' => "T",
        'v' => "V",
        'w' => "W",
        'x' => "K",
        'y' => "Y",
        'z' => "Z",
        _ => "S",
    }
}

/// Phonemes for a single word: lexicon lookup, then letter-by-letter fallback.
/// Non-alphabetic characters are stripped before either step.
fn word_phonemes(word: &str) -> Vec<String> {
    let cleaned: String = word.to_lowercase().chars().filter(|c| c.is_alphabetic()).collect();
    if let Some(entry) = base_lexicon(&cleaned) {
        return entry.iter().map(|s| s.to_string()).collect();
    }
    cleaned
        .chars()
        .map(|ch| match vowel(ch) {
            Some(p) => p.to_string(),
            None => consonant(ch).to_string(),
        })
        .collect()
}

/// Phonemes for a whole word list, flattened.
pub fn phonemes(words: &[String]) -> Vec<String> {
    words.iter().flat_map(|w| word_phonemes(w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_hit_is_exact() {
        assert_eq!(phonemes(&["cat".to_string()]), vec!["K", "AE", "T"]);
    }

    #[test]
    fn lexicon_miss_falls_through_to_letters() {
        let result = phonemes(&["zig".to_string()]);
        assert_eq!(result, vec!["Z", "IH", "G"]);
    }

    #[test]
    fn non_alphabetic_characters_are_stripped() {
        let result = phonemes(&["Ca-t!".to_string()]);
        assert_eq!(result, vec!["K", "AE", "T"]);
    }

    #[test]
    fn unmapped_consonant_defaults_to_s() {
        let result = phonemes(&["x".to_string()]);
        assert_eq!(result, vec!["K"]);
    }
}
