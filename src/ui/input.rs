//! Input line widget

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::input_utils::split_at_char;

use super::{styles, InputMode, RenderState};

/// Draw the input line.
///
/// `cursor_position` is a char index into the input, so the split and the
/// terminal cursor column stay on char boundaries whatever language is
/// being typed.
pub fn draw_input(frame: &mut Frame, area: Rect, state: &RenderState) {
    let (title, border_style) = match state.input_mode {
        InputMode::Normal => (" Input (* to talk) ", styles::border_style()),
        InputMode::Recording => (" Recording... (press * to stop) ", styles::recording_style()),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title);

    let (before, after) = split_at_char(state.input, state.cursor_position);

    let line = Line::from(vec![
        Span::raw("  "), // Left padding
        Span::styled(before.to_string(), styles::input_style()),
        Span::styled("│", styles::cursor_style()),
        Span::styled(after.to_string(), styles::input_style()),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);

    // Terminal cursor column counts chars, not bytes
    let column = before.chars().count() as u16;
    let x = area.x + 3 + column; // +1 border, +2 padding
    let y = area.y + 1;
    if x < area.x + area.width.saturating_sub(1) {
        frame.set_cursor_position((x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(input: &str, cursor_position: usize) {
        let state = RenderState {
            messages: &[],
            input,
            cursor_position,
            input_mode: InputMode::Normal,
            busy: false,
            model: "gpt-4o-mini",
            language: "fr",
            voice: "alloy",
            muted: false,
            scroll_offset: 0,
            status_message: None,
            last_error: None,
        };

        let mut terminal = Terminal::new(TestBackend::new(40, 3)).unwrap();
        terminal
            .draw(|frame| draw_input(frame, frame.area(), &state))
            .unwrap();
    }

    #[test]
    fn test_draw_with_multibyte_input() {
        // Cursor after a two-byte char must not split inside it
        render("é", 1);
        render("café", 4);
        render("späße", 3);
        render("こんにちは", 2);
    }

    #[test]
    fn test_draw_with_cursor_mid_input() {
        render("hello", 2);
        render("être à l'heure", 5);
    }

    #[test]
    fn test_draw_with_cursor_past_end() {
        render("hi", 5);
        render("", 0);
    }
}
