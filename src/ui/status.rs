//! Status bar widget

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{styles, InputMode, RenderState};

/// Draw the status bar
pub fn draw_status(frame: &mut Frame, area: Rect, state: &RenderState) {
    let mut spans = vec![];

    // Model
    spans.push(Span::styled(
        format!(" {} ", state.model),
        styles::model_style(),
    ));
    spans.push(Span::styled(" | ", styles::status_style()));

    // Activity indicator
    if state.input_mode == InputMode::Recording {
        spans.push(Span::styled("Recording", styles::recording_style()));
    } else if state.busy {
        spans.push(Span::styled("Waiting for reply...", styles::busy_style()));
    } else {
        spans.push(Span::styled("Ready", styles::voice_style()));
    }

    // Status message
    if let Some(msg) = state.status_message {
        spans.push(Span::styled(" | ", styles::status_style()));
        spans.push(Span::styled(msg, styles::status_style()));
    }

    // Locale/voice selection (right aligned)
    let voice_info = if state.muted {
        format!("{} muted ", state.language)
    } else {
        format!("{} {} ", state.language, state.voice)
    };

    let left_len: usize = spans.iter().map(|s| visible_len(&s.content)).sum();
    let padding = (area.width as usize).saturating_sub(left_len + visible_len(&voice_info));
    if padding > 0 {
        spans.push(Span::raw(" ".repeat(padding)));
    }
    spans.push(Span::styled(voice_info, styles::voice_style()));

    let line = Line::from(spans);
    let paragraph = Paragraph::new(line);

    frame.render_widget(paragraph, area);
}

/// On-screen width of a span's text: chars, not bytes
fn visible_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_len_counts_chars_not_bytes() {
        // Accented status text must not shift the right-aligned slot
        assert_eq!(visible_len("Heard: café"), 11);
        assert_eq!("Heard: café".len(), 12);
        assert_eq!(visible_len("es ça va"), 8);
        assert_eq!(visible_len(""), 0);
    }
}
