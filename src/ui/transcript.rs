//! Transcript view widget

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::conversation::Role;

use super::{styles, RenderState};

/// Draw the transcript area.
///
/// Renders the conversation's message sequence one-to-one, followed by the
/// inline error for the last turn (if any) and a waiting indicator while a
/// reply is in flight.
pub fn draw_transcript(frame: &mut Frame, area: Rect, state: &RenderState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .title(" Transcript ");

    let inner = block.inner(area);

    let mut lines: Vec<Line> = Vec::new();

    for message in state.messages {
        let (prefix, style) = match message.role {
            Role::User => ("You", styles::user_style()),
            Role::Assistant => ("Partner", styles::assistant_style()),
            Role::System => ("System", styles::system_style()),
        };

        lines.push(Line::from(Span::styled(format!("{prefix}: "), style)));
        for line in message.content.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(styles::TEXT),
            )));
        }
        lines.push(Line::from(""));
    }

    if let Some(error) = state.last_error {
        lines.push(Line::from(Span::styled(
            format!("Error: {error}"),
            styles::error_style(),
        )));
        lines.push(Line::from(""));
    }

    if state.busy {
        lines.push(Line::from(Span::styled("...", styles::busy_style())));
    }

    // Calculate scroll
    let visible_height = inner.height as usize;
    let total_lines = lines.len();
    let scroll = if total_lines > visible_height {
        let max_scroll = total_lines.saturating_sub(visible_height);
        max_scroll.saturating_sub(state.scroll_offset)
    } else {
        0
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));

    frame.render_widget(paragraph, area);
}
