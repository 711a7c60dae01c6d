//! Weakest-phoneme selection for the per-child curriculum upsert.

use std::collections::HashMap;

use speechpath_types::Segment;

const PAD_PHONEMES: [&str; 2] = ["R", "S"];

/// Accumulate confidence by phoneme, drop anything outside `vocabulary`,
/// then return up to 3 weakest phonemes by mean confidence (ascending),
/// padded with `{"R", "S"}` when fewer than three groups have data.
pub fn weakest_phonemes(segments: &[Segment], vocabulary: &speechpath_types::PhonemeVocabulary) -> Vec<String> {
    let mut acc: HashMap<&str, Vec<f32>> = HashMap::new();
    for s in segments {
        if !vocabulary.contains(&s.phoneme) {
            tracing::warn!(phoneme = %s.phoneme, "dropping out-of-vocabulary phoneme from curriculum update");
            continue;
        }
        acc.entry(s.phoneme.as_str()).or_default().push(s.confidence);
    }

    let mut items: Vec<(&str, f32)> = acc
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(p, v)| (p, v.iter().sum::<f32>() / v.len() as f32))
        .collect();
    items.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

    let mut weak: Vec<String> = items.into_iter().take(3).map(|(p, _)| p.to_string()).collect();
    let mut pad = PAD_PHONEMES.iter();
    while weak.len() < 3 {
        match pad.next() {
            Some(p) => weak.push(p.to_string()),
            None => break,
        }
    }
    weak
}

/// `1` if score < 70, else `2`.
pub fn difficulty_for_score(score: i32) -> i32 {
    if score < 70 {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speechpath_types::PhonemeVocabulary;

    #[test]
    fn picks_three_weakest_ascending() {
        let vocab = PhonemeVocabulary::default_vocabulary();
        let segments = vec![
            Segment::new("K", 0.0, 0.02, 0.9),
            Segment::new("T", 0.02, 0.04, 0.1),
            Segment::new("S", 0.04, 0.06, 0.5),
            Segment::new("B", 0.06, 0.08, 0.3),
        ];
        let weak = weakest_phonemes(&segments, &vocab);
        assert_eq!(weak, vec!["T", "B", "S"]);
    }

    #[test]
    fn empty_segments_pad_with_defaults() {
        let vocab = PhonemeVocabulary::default_vocabulary();
        assert_eq!(weakest_phonemes(&[], &vocab), vec!["R", "S"]);
    }

    #[test]
    fn single_weak_phoneme_is_padded_to_three() {
        let vocab = PhonemeVocabulary::default_vocabulary();
        let segments = vec![Segment::new("T", 0.0, 0.02, 0.1)];
        assert_eq!(weakest_phonemes(&segments, &vocab), vec!["T", "R", "S"]);
    }

    #[test]
    fn out_of_vocabulary_phonemes_are_dropped() {
        let vocab = PhonemeVocabulary::default_vocabulary();
        let segments = vec![Segment::new("XX", 0.0, 0.02, 0.9)];
        assert_eq!(weakest_phonemes(&segments, &vocab), vec!["R", "S"]);
    }

    #[test]
    fn difficulty_threshold() {
        assert_eq!(difficulty_for_score(69), 1);
        assert_eq!(difficulty_for_score(70), 2);
    }
}
