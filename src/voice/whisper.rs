//! OpenAI Whisper API integration

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

const WHISPER_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Sample rate Whisper expects
const WHISPER_SAMPLE_RATE: u32 = 16000;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribe audio samples using the Whisper API.
///
/// Returns `None` when the recognizer produced nothing usable (empty or
/// whitespace-only transcript).
pub async fn transcribe(
    samples: &[f32],
    sample_rate: u32,
    language: &str,
    api_key: &str,
) -> Result<Option<String>> {
    let samples = if sample_rate != WHISPER_SAMPLE_RATE {
        resample(samples, sample_rate, WHISPER_SAMPLE_RATE)
    } else {
        samples.to_vec()
    };

    let wav_data = encode_wav(&samples, WHISPER_SAMPLE_RATE)?;

    let part = Part::bytes(wav_data)
        .file_name("audio.wav")
        .mime_str("audio/wav")?;

    let form = Form::new()
        .part("file", part)
        .text("model", "whisper-1")
        .text("language", language.to_string());

    let client = reqwest::Client::new();
    let response = client
        .post(WHISPER_API_URL)
        .header("Authorization", format!("Bearer {api_key}"))
        .multipart(form)
        .send()
        .await?;

    if !response.status().is_success() {
        let error = response.text().await?;
        return Err(anyhow::anyhow!("Whisper API error: {error}"));
    }

    let result: TranscriptionResponse = response.json().await?;
    let text = result.text.trim().to_string();
    Ok((!text.is_empty()).then_some(text))
}

/// Simple linear resampling
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 * ratio;
        let idx = src_idx as usize;
        let frac = src_idx - idx as f64;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac as f32) + samples[idx + 1] * frac as f32
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

/// Encode samples as 16-bit mono WAV
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    use std::io::Cursor;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            let amplitude = (sample * 32767.0) as i16;
            writer.write_sample(amplitude)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity_at_equal_rates() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_halves_length() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample(&samples, 32000, 16000);
        assert_eq!(out.len(), 50);
    }

    #[test]
    fn test_resample_preserves_constant_signal() {
        let samples = vec![0.5; 200];
        let out = resample(&samples, 48000, 16000);
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_encode_wav_header() {
        let samples = vec![0.0f32; 160];
        let wav = encode_wav(&samples, 16000).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 160);
    }
}
