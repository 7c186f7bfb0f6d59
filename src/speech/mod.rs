//! Speech output: TTS synthesis and speaker playback

mod speaker;
mod synth;

pub use speaker::*;
pub use synth::*;
