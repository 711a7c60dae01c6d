//! Character-map G2P for Persian script, bypassing any lexicon or cache.

fn map_char(ch: char) -> &'static str {
    match ch {
        'ا' | 'آ' => "AA",
        'ب' => "B",
        'پ' => "P",
        'ت' => "T",
        'ث' => "S",
        'ج' => "JH",
        'چ' => "CH",
        'ح' => "HH",
        'خ' => "KH",
        'د' => "D",
        'ذ' => "Z",
        'ر' => "R",
        'ز' => "Z",
        'ژ' => "ZH",
        'س' => "S",
        'ش' => "SH",
        'ص' => "S",
        'ض' => "Z",
        'ط' => "T",
        'ظ' => "Z",
        'ع' => "AH",
        'غ' => "GH",
        'ف' => "F",
        'ق' => "G",
        'ک' => "K",
        'گ' => "G",
        'ل' => "L",
        'م' => "M",
        'ن' => "N",
        'و' => "V",
        'ه' => "HH",
        'ی' => "Y",
        _ => "AH",
    }
}

/// Phonemes for Persian text, one symbol per character, unmapped characters
/// default to the open vowel.
pub fn phonemes(words: &[String]) -> Vec<String> {
    words
        .iter()
        .flat_map(|w| w.chars().map(map_char).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_letters() {
        assert_eq!(phonemes(&["با".to_string()]), vec!["B", "AA"]);
    }

    #[test]
    fn unknown_character_defaults_to_open_vowel() {
        assert_eq!(phonemes(&["x".to_string()]), vec!["AH"]);
    }
}
