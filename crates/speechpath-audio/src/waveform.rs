//! Decode a fetched audio blob into mono f32 samples.

use std::io::Cursor;

use thiserror::Error;

/// Mono waveform with its declared sample rate. Multi-channel sources are
/// collapsed to mono by averaging before this type is ever constructed.
#[derive(Debug, Clone)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate.max(1) as f64
    }

    pub fn mean_abs_amplitude(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.abs()).sum::<f32>() / self.samples.len() as f32
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty audio payload")]
    Empty,
    #[error("unsupported or malformed audio data: {0}")]
    Malformed(String),
}

/// Decode WAV/FLAC/OGG (or anything symphonia's default codec set supports)
/// from an in-memory byte buffer. WAV is tried first via `hound` since that
/// is the common case and avoids symphonia's heavier probe; anything else
/// falls through to symphonia.
pub fn decode(bytes: &[u8]) -> Result<Waveform, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    if bytes.len() >= 4 && &bytes[0..4] == b"RIFF" {
        return decode_wav(bytes);
    }

    decode_with_symphonia(bytes)
}

fn decode_wav(bytes: &[u8]) -> Result<Waveform, DecodeError> {
    let cursor = Cursor::new(bytes);
    let reader =
        hound::WavReader::new(cursor).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .filter_map(|s| s.ok())
            .collect(),
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            let max_val = (1i64 << (bits - 1).max(1)) as f32;
            reader
                .into_samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| s as f32 / max_val)
                .collect()
        }
    };

    Ok(Waveform {
        samples: downmix(samples, channels),
        sample_rate,
    })
}

fn decode_with_symphonia(bytes: &[u8]) -> Result<Waveform, DecodeError> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), MediaSourceStreamOptions::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| DecodeError::Malformed("no audio track found".into()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::Malformed("unknown sample rate".into()))?;
    let channels = track
        .codec_params
        .channels
        .ok_or_else(|| DecodeError::Malformed("unknown channel count".into()))?
        .count();

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(_) => continue,
        };
        let spec = *decoded.spec();

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(DecodeError::Malformed("no samples decoded".into()));
    }

    Ok(Waveform {
        samples: downmix(samples, channels),
        sample_rate,
    })
}

fn downmix(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_mono_wav() {
        let samples = vec![0.1, -0.1, 0.2, -0.2];
        let bytes = wav_bytes(&samples, 16000);
        let wav = decode(&bytes).unwrap();
        assert_eq!(wav.sample_rate, 16000);
        assert_eq!(wav.samples.len(), 4);
    }

    #[test]
    fn empty_payload_is_an_error() {
        assert!(matches!(decode(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn garbage_payload_is_malformed() {
        let bytes = vec![0u8, 1, 2, 3, 4, 5, 6, 7];
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn mean_abs_amplitude_matches_fallback_threshold() {
        let wav = Waveform {
            samples: vec![0.2, -0.2, 0.2, -0.2],
            sample_rate: 16000,
        };
        assert!(wav.mean_abs_amplitude() > 0.1);
    }
}
