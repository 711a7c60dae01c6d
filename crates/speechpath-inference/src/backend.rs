//! Acoustic and emotion inference backend.
//!
//! Two models, two pure functions: `asr_logits` turns a waveform into a
//! `[T, V]` CTC logits matrix, `emotion` turns it into one of five labels.
//! When a model path is absent, a deterministic fallback keeps the rest of
//! the pipeline exercisable (see module-level tests and
//! `speechpath-worker`'s end-to-end scenarios).

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;
use speechpath_types::EmotionLabel;

/// Fixed hop size assumed throughout the decoder, in seconds.
pub const FRAME_HOP_SECONDS: f64 = 0.02;

const EMOTION_LABELS: [EmotionLabel; 5] = [
    EmotionLabel::Neutral,
    EmotionLabel::Happy,
    EmotionLabel::Sad,
    EmotionLabel::Angry,
    EmotionLabel::Frustrated,
];

pub trait InferenceBackend: Send + Sync {
    /// Compute CTC logits `[T, V]` for a mono waveform at the given sample rate.
    fn asr_logits(&self, samples: &[f32], sample_rate: u32) -> Result<Array2<f32>>;

    /// Classify the dominant emotion of a mono waveform.
    fn emotion(&self, samples: &[f32], sample_rate: u32) -> Result<EmotionLabel>;

    fn asr_loaded(&self) -> bool;
    fn ser_loaded(&self) -> bool;
}

/// ONNX-backed implementation with a deterministic fallback for either model.
pub struct OnnxInferenceBackend {
    asr_session: Option<Mutex<ort::session::Session>>,
    ser_session: Option<Mutex<ort::session::Session>>,
    vocab_size: usize,
}

impl OnnxInferenceBackend {
    /// Load the ASR/SER sessions from disk. A missing path is not an error —
    /// the corresponding session is left unloaded and the fallback is used.
    /// A *present but unreadable* path fails construction outright: startup
    /// should not silently mask a broken model file.
    pub fn load(asr_path: Option<&Path>, ser_path: Option<&Path>, vocab_size: usize) -> Result<Self> {
        let asr_session = match asr_path {
            Some(p) if p.exists() => {
                tracing::info!(path = %p.display(), "loading ASR model");
                Some(Mutex::new(
                    ort::session::Session::builder()?
                        .commit_from_file(p)
                        .with_context(|| format!("failed to load ASR model at {}", p.display()))?,
                ))
            }
            Some(p) => {
                tracing::warn!(path = %p.display(), "ASR model path configured but absent; using fallback logits");
                None
            }
            None => None,
        };

        let ser_session = match ser_path {
            Some(p) if p.exists() => {
                tracing::info!(path = %p.display(), "loading SER model");
                Some(Mutex::new(
                    ort::session::Session::builder()?
                        .commit_from_file(p)
                        .with_context(|| format!("failed to load SER model at {}", p.display()))?,
                ))
            }
            Some(p) => {
                tracing::warn!(path = %p.display(), "SER model path configured but absent; using amplitude fallback");
                None
            }
            None => None,
        };

        Ok(Self {
            asr_session,
            ser_session,
            vocab_size,
        })
    }

    fn fallback_logits(&self, samples: &[f32], sample_rate: u32) -> Array2<f32> {
        fallback_asr_logits(samples, sample_rate, self.vocab_size)
    }

    fn fallback_emotion(samples: &[f32]) -> EmotionLabel {
        fallback_emotion(samples)
    }
}

/// Deterministic fallback ASR logits, used whenever no model is loaded.
///
/// `T = max(1, floor(|waveform| / (sr * 0.02)))` frames, small Gaussian
/// noise, the blank column biased high and one non-blank column biased by
/// the mean absolute sample, so the decoder always has something to collapse.
pub fn fallback_asr_logits(samples: &[f32], sample_rate: u32, vocab_size: usize) -> Array2<f32> {
    let sr = sample_rate.max(1) as f64;
    let frames_per_sample = sr * FRAME_HOP_SECONDS;
    let t = ((samples.len() as f64 / frames_per_sample).floor() as usize).max(1);
    let v = vocab_size.max(1);

    let mut rng = rand::rng();
    let mut logits = Array2::<f32>::zeros((t, v));
    for x in logits.iter_mut() {
        *x = rng.sample::<f32, _>(StandardNormal) * 0.1;
    }

    for mut row in logits.rows_mut() {
        row[0] += 4.0;
    }

    let mean_abs = if samples.is_empty() {
        0.0
    } else {
        samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
    };
    let bias_col = 8.min(v - 1);
    for mut row in logits.rows_mut() {
        row[bias_col] += mean_abs * 5.0;
    }

    logits
}

/// Deterministic fallback emotion label: amplitude-gated happy/neutral.
pub fn fallback_emotion(samples: &[f32]) -> EmotionLabel {
    if samples.is_empty() {
        return EmotionLabel::Neutral;
    }
    let mean_abs = samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32;
    if mean_abs > 0.1 {
        EmotionLabel::Happy
    } else {
        EmotionLabel::Neutral
    }
}

impl InferenceBackend for OnnxInferenceBackend {
    fn asr_logits(&self, samples: &[f32], sample_rate: u32) -> Result<Array2<f32>> {
        let Some(session) = &self.asr_session else {
            return Ok(self.fallback_logits(samples, sample_rate));
        };

        let mut guard = session.lock().unwrap();
        let input = ort::value::Tensor::from_array(([1_i64, samples.len() as i64], samples.to_vec()))
            .context("failed to build ASR input tensor")?;
        let outputs = guard
            .run(ort::inputs!["input" => input])
            .context("ASR inference failed")?;
        let output = outputs
            .values()
            .next()
            .context("ASR model produced no output tensors")?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .context("failed to extract ASR output tensor")?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let (t, v) = match dims.as_slice() {
            [_, t, v] => (*t as usize, *v as usize),
            [t, v] => (*t as usize, *v as usize),
            _ => anyhow::bail!("unexpected ASR output shape: {:?}", dims),
        };

        Array2::from_shape_vec((t, v), data.to_vec()).context("ASR output shape mismatch")
    }

    fn emotion(&self, samples: &[f32], _sample_rate: u32) -> Result<EmotionLabel> {
        let Some(session) = &self.ser_session else {
            return Ok(Self::fallback_emotion(samples));
        };

        let mut guard = session.lock().unwrap();
        let input = ort::value::Tensor::from_array(([1_i64, samples.len() as i64], samples.to_vec()))
            .context("failed to build SER input tensor")?;
        let outputs = guard
            .run(ort::inputs!["input" => input])
            .context("SER inference failed")?;
        let output = outputs
            .values()
            .next()
            .context("SER model produced no output tensors")?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .context("failed to extract SER output tensor")?;

        let (idx, _) = data
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .context("empty SER output")?;
        Ok(EMOTION_LABELS[idx % EMOTION_LABELS.len()])
    }

    fn asr_loaded(&self) -> bool {
        self.asr_session.is_some()
    }

    fn ser_loaded(&self) -> bool {
        self.ser_session.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_logits_have_expected_shape() {
        let samples = vec![0.1f32; 16000]; // 1s @ 16kHz
        let logits = fallback_asr_logits(&samples, 16000, 40);
        assert_eq!(logits.ncols(), 40);
        assert_eq!(logits.nrows(), 50); // 1s / 20ms
    }

    #[test]
    fn fallback_logits_never_empty_for_nonzero_audio() {
        let samples = vec![0.0f32; 1]; // shorter than one frame
        let logits = fallback_asr_logits(&samples, 16000, 40);
        assert_eq!(logits.nrows(), 1);
    }

    #[test]
    fn fallback_emotion_follows_amplitude_threshold() {
        let loud = vec![0.2f32; 100];
        let quiet = vec![0.01f32; 100];
        assert_eq!(fallback_emotion(&loud), EmotionLabel::Happy);
        assert_eq!(fallback_emotion(&quiet), EmotionLabel::Neutral);
    }

    #[test]
    fn blank_column_is_biased_above_baseline_on_average() {
        let samples = vec![0.0f32; 16000];
        let logits = fallback_asr_logits(&samples, 16000, 40);
        let blank_mean = logits.column(0).mean().unwrap();
        let other_mean = logits.column(1).mean().unwrap();
        assert!(blank_mean > other_mean);
    }
}
