//! Push-to-talk audio capture using cpal

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tokio::sync::mpsc;

use crate::app::AppMessage;

use super::whisper::transcribe;

/// Captures microphone audio and hands it to Whisper on stop.
///
/// One capture per invocation: start opens the stream, stop closes it and
/// kicks off transcription in the background. The result comes back to the
/// event loop as an `AppMessage`.
pub struct Recorder {
    message_tx: mpsc::Sender<AppMessage>,
    api_key: String,
    recording: Arc<AtomicBool>,
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate: Arc<Mutex<u32>>,
}

impl Recorder {
    pub fn new(message_tx: mpsc::Sender<AppMessage>, api_key: String) -> Self {
        Self {
            message_tx,
            api_key,
            recording: Arc::new(AtomicBool::new(false)),
            samples: Arc::new(Mutex::new(Vec::new())),
            sample_rate: Arc::new(Mutex::new(16000)),
        }
    }

    /// Open the input stream and start collecting samples
    pub fn start(&self) -> Result<()> {
        self.samples.lock().unwrap().clear();
        self.recording.store(true, Ordering::SeqCst);

        let samples = self.samples.clone();
        let sample_rate_store = self.sample_rate.clone();
        let recording = self.recording.clone();
        let tx = self.message_tx.clone();

        // Capture runs on a dedicated thread (cpal Stream isn't Send)
        std::thread::spawn(move || {
            if let Err(e) = run_capture(samples, sample_rate_store, recording) {
                tracing::error!("capture error: {e}");
                let _ = tx.blocking_send(AppMessage::VoiceError(e.to_string()));
            }
        });

        Ok(())
    }

    /// Stop capturing and transcribe whatever was heard
    pub async fn stop(&self, language: String) {
        self.recording.store(false, Ordering::SeqCst);

        // Let the stream wind down before taking the buffer
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

        let samples = std::mem::take(&mut *self.samples.lock().unwrap());
        let sample_rate = *self.sample_rate.lock().unwrap();

        if samples.is_empty() {
            let _ = self.message_tx.send(AppMessage::Transcript(None)).await;
            return;
        }

        let tx = self.message_tx.clone();
        let api_key = self.api_key.clone();

        tokio::spawn(async move {
            match transcribe(&samples, sample_rate, &language, &api_key).await {
                Ok(text) => {
                    let _ = tx.send(AppMessage::Transcript(text)).await;
                }
                Err(e) => {
                    let _ = tx.send(AppMessage::VoiceError(e.to_string())).await;
                }
            }
        });
    }

    /// Stop capturing and throw the buffer away
    pub async fn cancel(&self) {
        self.recording.store(false, Ordering::SeqCst);
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        self.samples.lock().unwrap().clear();
    }
}

/// Keep the input stream alive until the run flag drops
fn run_capture(
    samples: Arc<Mutex<Vec<f32>>>,
    sample_rate_store: Arc<Mutex<u32>>,
    recording: Arc<AtomicBool>,
) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow::anyhow!("No input device available"))?;

    let config = device.default_input_config()?;
    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;

    *sample_rate_store.lock().unwrap() = sample_rate;

    tracing::debug!("recording at {sample_rate} Hz, {channels} channels");

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_input::<f32>(&device, &config.into(), channels, samples, recording.clone())?
        }
        cpal::SampleFormat::I16 => {
            build_input::<i16>(&device, &config.into(), channels, samples, recording.clone())?
        }
        cpal::SampleFormat::U16 => {
            build_input::<u16>(&device, &config.into(), channels, samples, recording.clone())?
        }
        format => return Err(anyhow::anyhow!("Unsupported sample format: {format}")),
    };

    stream.play()?;

    while recording.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    // Dropping the stream closes the device
    Ok(())
}

/// Build an input stream that folds frames to mono f32
fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    samples: Arc<Mutex<Vec<f32>>>,
    recording: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    use cpal::Sample;

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if !recording.load(Ordering::SeqCst) {
                return;
            }
            let mut samples = samples.lock().unwrap();
            for frame in data.chunks(channels) {
                let mono: f32 =
                    frame.iter().map(|&s| f32::from_sample(s)).sum::<f32>() / channels as f32;
                samples.push(mono);
            }
        },
        |err| {
            tracing::error!("audio input error: {err}");
        },
        None,
    )?;

    Ok(stream)
}
