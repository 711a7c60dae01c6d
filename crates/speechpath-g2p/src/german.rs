//! Character-map G2P for German, bypassing any lexicon or cache.
//!
//! Umlauts and eszett are normalized to their digraph spellings before the
//! per-character vowel/consonant map is applied, mirroring standard German
//! transliteration practice.

fn normalize(word: &str) -> String {
    word.to_lowercase()
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
        .replace('ß', "ss")
}

fn vowel(ch: char) -> Option<&'static str> {
    match ch {
        'a' => Some("AA"),
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
        'w' => "V",
        'x' => "K",
        'y' => "Y",
        'z' => "Z",
        _ => "S",
    }
}

/// Phonemes for German text, digraph-normalized then mapped per letter.
/// Non-alphabetic characters are dropped.
pub fn phonemes(words: &[String]) -> Vec<String> {
    let mut seq = Vec::new();
    for w in words {
        for ch in normalize(w).chars() {
            if let Some(v) = vowel(ch) {
                seq.push(v.to_string());
            } else if ch.is_alphabetic() {
                seq.push(consonant(ch).to_string());
            }
        }
    }
    seq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umlauts_are_normalized_before_mapping() {
        let result = phonemes(&["für".to_string()]);
        assert_eq!(result, vec!["F", "UH", "EH", "R"]);
    }

    #[test]
    fn eszett_normalizes_to_double_s() {
        let result = phonemes(&["straße".to_string()]);
        assert_eq!(result.last().cloned(), Some("S".to_string()));
    }

    #[test]
    fn non_alphabetic_is_dropped() {
        let result = phonemes(&["a-b".to_string()]);
        assert_eq!(result, vec!["AA", "B"]);
    }
}
