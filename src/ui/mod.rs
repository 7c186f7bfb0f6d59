//! UI components using ratatui

mod input;
mod layout;
mod status;
mod styles;
mod transcript;

pub use input::*;
pub use layout::*;
pub use status::*;
pub use styles::*;
pub use transcript::*;

use ratatui::Frame;

use crate::conversation::Message;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal text input
    Normal,
    /// Recording voice
    Recording,
}

/// State needed for rendering (borrowed references)
pub struct RenderState<'a> {
    pub messages: &'a [Message],
    pub input: &'a str,
    pub cursor_position: usize,
    pub input_mode: InputMode,
    pub busy: bool,
    pub model: &'a str,
    pub language: &'a str,
    pub voice: &'a str,
    pub muted: bool,
    pub scroll_offset: usize,
    pub status_message: Option<&'a str>,
    pub last_error: Option<&'a str>,
}

/// Main draw function
pub fn draw(frame: &mut Frame, state: &RenderState) {
    let chunks = create_layout(frame.area());

    // Draw transcript area
    draw_transcript(frame, chunks[0], state);

    // Draw input area
    draw_input(frame, chunks[1], state);

    // Draw status bar
    draw_status(frame, chunks[2], state);
}
