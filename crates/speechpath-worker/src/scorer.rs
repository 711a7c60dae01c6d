//! Composite quality score and weakness tagging.

use speechpath_types::{EmotionLabel, Segment, WeaknessTag};

/// `0` for an empty segment list, otherwise `60 + 40·mean(confidence)`
/// penalized `-10` for a negative emotion and clamped to `[0,100]`.
pub fn composite_score(segments: &[Segment], emotion: EmotionLabel) -> i32 {
    if segments.is_empty() {
        return 0;
    }
    let avg_conf = segments.iter().map(|s| s.confidence as f64).sum::<f64>() / segments.len() as f64;
    let mut base = (60.0 + 40.0 * avg_conf) as i32;
    if emotion.is_negative() {
        base -= 10;
    }
    base.clamp(0, 100)
}

/// `articulation` below 75, otherwise `prosody`.
pub fn weakness_tag(score: i32) -> WeaknessTag {
    if score < 75 {
        WeaknessTag::Articulation
    } else {
        WeaknessTag::Prosody
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(confidence: f32) -> Segment {
        Segment::new("K", 0.0, 0.02, confidence)
    }

    #[test]
    fn empty_segments_score_zero() {
        assert_eq!(composite_score(&[], EmotionLabel::Neutral), 0);
    }

    #[test]
    fn score_maps_confidence_into_sixty_to_hundred() {
        let segments = vec![seg(1.0)];
        assert_eq!(composite_score(&segments, EmotionLabel::Neutral), 100);
        let segments = vec![seg(0.0)];
        assert_eq!(composite_score(&segments, EmotionLabel::Neutral), 60);
    }

    #[test]
    fn negative_emotion_applies_penalty() {
        let segments = vec![seg(0.45)]; // base 78
        assert_eq!(composite_score(&segments, EmotionLabel::Neutral), 78);
        assert_eq!(composite_score(&segments, EmotionLabel::Frustrated), 68);
    }

    #[test]
    fn score_never_exceeds_bounds() {
        let segments = vec![seg(1.0)];
        assert!(composite_score(&segments, EmotionLabel::Angry) <= 100);
    }

    #[test]
    fn weakness_tag_threshold() {
        assert_eq!(weakness_tag(74), WeaknessTag::Articulation);
        assert_eq!(weakness_tag(75), WeaknessTag::Prosody);
    }
}
