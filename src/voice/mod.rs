//! Speech input: microphone capture plus Whisper transcription

mod recorder;
mod whisper;

pub use recorder::*;
pub use whisper::*;
