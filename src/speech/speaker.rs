//! Audio playback for synthesized replies

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use crate::voice::resample;

/// Fire-and-forget playback of synthesized speech.
///
/// Each `speak` bumps a generation counter; a playback thread that observes
/// a newer generation drops its stream, so a new utterance always flushes
/// the one still playing. There is no queue.
#[derive(Clone)]
pub struct Speaker {
    generation: Arc<AtomicU64>,
}

impl Speaker {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Play the given samples, flushing any utterance still in progress
    pub fn speak(&self, samples: Vec<f32>, sample_rate: u32) {
        let my_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();

        // Playback runs on a dedicated thread (cpal Stream isn't Send)
        std::thread::spawn(move || {
            if let Err(e) = run_playback(samples, sample_rate, generation, my_gen) {
                tracing::error!("playback error: {e}");
            }
        });
    }

    /// Flush any utterance still in progress without starting a new one
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for Speaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive one utterance through the default output device
fn run_playback(
    samples: Vec<f32>,
    sample_rate: u32,
    generation: Arc<AtomicU64>,
    my_gen: u64,
) -> Result<()> {
    if samples.is_empty() {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;

    let config = device.default_output_config()?;
    let device_rate = config.sample_rate().0;
    let channels = config.channels() as usize;

    let samples = if device_rate != sample_rate {
        resample(&samples, sample_rate, device_rate)
    } else {
        samples
    };

    tracing::debug!(
        "speaking {} samples at {device_rate} Hz, {channels} channels",
        samples.len()
    );

    let done = Arc::new(AtomicBool::new(false));

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_output::<f32>(&device, &config.into(), channels, samples, done.clone())?
        }
        cpal::SampleFormat::I16 => {
            build_output::<i16>(&device, &config.into(), channels, samples, done.clone())?
        }
        cpal::SampleFormat::U16 => {
            build_output::<u16>(&device, &config.into(), channels, samples, done.clone())?
        }
        format => return Err(anyhow::anyhow!("Unsupported sample format: {format}")),
    };

    stream.play()?;

    // Hold the stream until the utterance ends or a newer one flushes it
    while !done.load(Ordering::SeqCst) && generation.load(Ordering::SeqCst) == my_gen {
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    Ok(())
}

/// Build an output stream that fans mono samples out to every channel
fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    samples: Vec<f32>,
    done: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    use cpal::Sample;

    let mut pos = 0usize;
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let sample = if pos < samples.len() {
                    let s = samples[pos];
                    pos += 1;
                    s
                } else {
                    done.store(true, Ordering::SeqCst);
                    0.0
                };
                let value = T::from_sample(sample);
                for out in frame.iter_mut() {
                    *out = value;
                }
            }
        },
        |err| {
            tracing::error!("audio output error: {err}");
        },
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_advances_generation() {
        let speaker = Speaker::new();
        let before = speaker.generation.load(Ordering::SeqCst);
        speaker.stop();
        assert_eq!(speaker.generation.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_clones_share_generation() {
        let speaker = Speaker::new();
        let other = speaker.clone();
        speaker.stop();
        assert_eq!(other.generation.load(Ordering::SeqCst), 1);
    }
}
