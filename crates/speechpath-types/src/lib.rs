//! Shared data model for the speech-therapy inference worker.
//!
//! These types cross crate boundaries: the audio, inference, G2P and worker
//! crates all exchange values defined here rather than reaching into each
//! other's internals.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A decoded/aligned phoneme segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub phoneme: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub confidence: f32,
}

impl Segment {
    /// Build a segment, rounding times to 3 decimals.
    pub fn new(phoneme: impl Into<String>, start_seconds: f64, end_seconds: f64, confidence: f32) -> Self {
        Self {
            phoneme: phoneme.into(),
            start_seconds: round3(start_seconds),
            end_seconds: round3(end_seconds),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Emotion label emitted by the SER backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Frustrated,
}

impl EmotionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Frustrated => "frustrated",
        }
    }

    /// Emotions that apply the scorer's negative-engagement penalty.
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            EmotionLabel::Sad | EmotionLabel::Angry | EmotionLabel::Frustrated
        )
    }
}

/// Weakness tag attached to a feedback report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaknessTag {
    Articulation,
    Prosody,
}

impl WeaknessTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeaknessTag::Articulation => "articulation",
            WeaknessTag::Prosody => "prosody",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            WeaknessTag::Articulation => {
                "Slow down and repeat target words; emphasize endings."
            }
            WeaknessTag::Prosody => "Vary pitch and stress; try call-and-response games.",
        }
    }
}

/// One row of `FeedbackReports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub id: Uuid,
    pub submission_id: String,
    pub overall_score: i32,
    pub weakness: WeaknessTag,
    pub recommendation: String,
    pub segments: Vec<Segment>,
    pub emotion_label: EmotionLabel,
    pub created_at: DateTime<Utc>,
}

/// One row of `ChildCurricula`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildCurriculum {
    pub id: Uuid,
    pub child_id: String,
    pub focus_phonemes_csv: String,
    pub difficulty: i32,
    pub success_streak: i32,
    pub updated_at: DateTime<Utc>,
}

/// The `worker_drift_baseline` row for `name = "phoneme_hist"`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DriftBaseline {
    pub hist: Vec<f64>,
}

/// A `(child_id, word) -> phonemes` cache entry from `child_g2p_cache`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct G2PCacheEntry {
    pub child_id: String,
    pub word: String,
    pub phonemes: Vec<String>,
}

/// The raw queue payload before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQueueMessage {
    #[serde(rename = "submissionId")]
    pub submission_id: Option<String>,
    #[serde(rename = "childId")]
    pub child_id: Option<String>,
    #[serde(rename = "blobUrl")]
    pub blob_url: Option<String>,
}

/// A validated queue message: every field is present and non-blank.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub submission_id: String,
    pub child_id: String,
    pub blob_url: String,
}

/// Error produced when a raw payload is missing or blank a required field.
#[derive(Debug, Clone, thiserror::Error)]
#[error("missing or blank required field: {0}")]
pub struct ValidationError(pub &'static str);

impl QueueMessage {
    /// Parse and validate a raw JSON payload. Any missing/blank field is a
    /// permanent validation failure.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let parsed: RawQueueMessage =
            serde_json::from_str(raw).map_err(|_| ValidationError("payload"))?;
        Self::from_raw(parsed)
    }

    pub fn from_raw(raw: RawQueueMessage) -> Result<Self, ValidationError> {
        let submission_id = non_blank(raw.submission_id).ok_or(ValidationError("submissionId"))?;
        let child_id = non_blank(raw.child_id).ok_or(ValidationError("childId"))?;
        let blob_url = non_blank(raw.blob_url).ok_or(ValidationError("blobUrl"))?;
        Ok(Self {
            submission_id,
            child_id,
            blob_url,
        })
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    match v {
        Some(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// Built-in 40-entry ARPAbet-style vocabulary, `<blank>` at index 0.
pub const DEFAULT_PHONEMES: &[&str] = &[
    "<blank>", "AA", "AE", "AH", "AO", "AW", "AY", "B", "CH", "D", "DH", "EH", "ER", "EY", "F",
    "G", "HH", "IH", "IY", "JH", "K", "L", "M", "N", "NG", "OW", "OY", "P", "R", "S", "SH", "T",
    "TH", "UH", "UW", "V", "W", "Y", "Z", "ZH",
];

/// Ordered phoneme symbol table with O(1) lookup in both directions.
///
/// Immutable after construction; the worker builds exactly one instance at
/// startup and shares it (by `Arc`) across every handler.
#[derive(Debug, Clone)]
pub struct PhonemeVocabulary {
    symbols: Vec<String>,
    index_of: HashMap<String, usize>,
}

/// Index 0 is always the CTC blank symbol.
pub const BLANK_ID: usize = 0;

impl PhonemeVocabulary {
    pub fn new(symbols: Vec<String>) -> Self {
        let index_of = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        Self { symbols, index_of }
    }

    pub fn default_vocabulary() -> Self {
        Self::new(DEFAULT_PHONEMES.iter().map(|s| s.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbol(&self, id: usize) -> Option<&str> {
        self.symbols.get(id).map(|s| s.as_str())
    }

    /// Look up a phoneme's vocabulary id. An unknown symbol silently maps to
    /// `BLANK_ID` — callers that need to distinguish a true miss should check
    /// `contains` first.
    pub fn id_of(&self, symbol: &str) -> usize {
        self.index_of.get(symbol).copied().unwrap_or(BLANK_ID)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.index_of.contains_key(symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocabulary_has_forty_entries_with_blank_first() {
        let vocab = PhonemeVocabulary::default_vocabulary();
        assert_eq!(vocab.len(), 40);
        assert_eq!(vocab.symbol(0), Some("<blank>"));
        assert_eq!(vocab.id_of("<blank>"), BLANK_ID);
    }

    #[test]
    fn lookup_is_bidirectional() {
        let vocab = PhonemeVocabulary::default_vocabulary();
        let id = vocab.id_of("K");
        assert_eq!(vocab.symbol(id), Some("K"));
    }

    #[test]
    fn unknown_symbol_maps_to_blank() {
        let vocab = PhonemeVocabulary::default_vocabulary();
        assert_eq!(vocab.id_of("NOT_A_PHONEME"), BLANK_ID);
        assert!(!vocab.contains("NOT_A_PHONEME"));
    }

    #[test]
    fn queue_message_rejects_blank_fields() {
        let raw = RawQueueMessage {
            submission_id: Some("s1".into()),
            child_id: Some("c1".into()),
            blob_url: Some("   ".into()),
        };
        assert!(QueueMessage::from_raw(raw).is_err());
    }

    #[test]
    fn queue_message_accepts_full_payload() {
        let json = r#"{"submissionId":"s1","childId":"c1","blobUrl":"https://x/y"}"#;
        let msg = QueueMessage::parse(json).unwrap();
        assert_eq!(msg.submission_id, "s1");
        assert_eq!(msg.child_id, "c1");
        assert_eq!(msg.blob_url, "https://x/y");
    }
}
