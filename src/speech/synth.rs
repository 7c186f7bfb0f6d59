//! OpenAI speech synthesis API integration

use anyhow::Result;
use serde::Serialize;

const SPEECH_API_URL: &str = "https://api.openai.com/v1/audio/speech";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Synthesize text to audio samples.
///
/// Requests WAV so the result can be decoded with hound and fed straight to
/// the output device. Returns mono f32 samples and their sample rate.
pub async fn synthesize(text: &str, voice: &str, api_key: &str) -> Result<(Vec<f32>, u32)> {
    let request = SpeechRequest {
        model: "tts-1",
        input: text,
        voice,
        response_format: "wav",
    };

    let client = reqwest::Client::new();
    let response = client
        .post(SPEECH_API_URL)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        let error = response.text().await?;
        return Err(anyhow::anyhow!("Speech API error: {error}"));
    }

    let wav_data = response.bytes().await?;
    decode_wav(&wav_data)
}

/// Decode WAV bytes to mono f32 samples
fn decode_wav(data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::new(std::io::Cursor::new(data))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
    };

    let samples = if channels > 1 {
        raw.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        raw
    };

    Ok((samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wav(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
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
    fn test_decode_wav_mono() {
        let wav = make_wav(&[0, 16384, -16384], 1, 24000);
        let (samples, rate) = decode_wav(&wav).unwrap();
        assert_eq!(rate, 24000);
        assert_eq!(samples.len(), 3);
        assert!((samples[1] - 0.5).abs() < 0.01);
        assert!((samples[2] + 0.5).abs() < 0.01);
    }

    #[test]
    fn test_decode_wav_folds_stereo() {
        // L/R pairs average to mono
        let wav = make_wav(&[16384, 0, 0, 16384], 2, 24000);
        let (samples, _) = decode_wav(&wav).unwrap();
        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.25).abs() < 0.01);
        assert!((samples[1] - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_decode_wav_rejects_garbage() {
        assert!(decode_wav(b"definitely not a wav").is_err());
    }
}
