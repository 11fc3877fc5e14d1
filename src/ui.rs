use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use unicode_width::UnicodeWidthChar;

use crate::app::App;
use crate::session::ChatSession;
use crate::state::Origin;

const PLACEHOLDER: &str = "Type your message...";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input row, footer
    let [header_area, chat_area, input_row, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_row);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" MCP Chatbot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn role_line(origin: Origin) -> Line<'static> {
    let color = match origin {
        Origin::User => Color::Cyan,
        Origin::Assistant => Color::Yellow,
    };
    Line::from(Span::styled(
        format!("{}:", origin.label()),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
}

/// Transcript as styled lines; newlines inside a message start new lines.
fn transcript_text(session: &ChatSession, waiting: bool, animation_frame: u8) -> Text<'_> {
    let mut lines: Vec<Line> = Vec::new();
    for msg in session.transcript() {
        lines.push(role_line(msg.origin()));
        for line in msg.text().split('\n') {
            lines.push(Line::from(line));
        }
        lines.push(Line::default());
    }

    if waiting {
        lines.push(role_line(Origin::Assistant));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    Text::from(lines)
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let inner_width = area.width.saturating_sub(2);
    app.chat_height = area.height.saturating_sub(2);

    let text = transcript_text(&app.session, app.is_waiting(), app.animation_frame);
    let chat = Paragraph::new(text).wrap(Wrap { trim: false });

    // Measure with the same wrapping the paragraph renders with
    app.total_lines = u16::try_from(chat.line_count(inner_width)).unwrap_or(u16::MAX);
    let max_scroll = app.max_scroll();
    app.scroll = if app.follow {
        max_scroll
    } else {
        app.scroll.min(max_scroll)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    frame.render_widget(chat.block(block).scroll((app.scroll, 0)), area);

    if max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize)
            .position(app.scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin { vertical: 1, horizontal: 0 }),
            &mut scrollbar_state,
        );
    }
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Horizontal window over the draft that keeps the cursor on screen.
///
/// Returns the number of chars scrolled off the left and the cursor's
/// column inside the field, both measured in terminal cells.
fn input_window(draft: &str, cursor: usize, width: usize) -> (usize, usize) {
    let widths: Vec<usize> = draft.chars().take(cursor).map(char_width).collect();
    let mut offset = 0;
    let mut column: usize = widths.iter().sum();
    // Leave one cell for the cursor itself
    while width > 0 && column >= width && offset < widths.len() {
        column -= widths[offset];
        offset += 1;
    }
    (offset, column)
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(10),
    ])
    .areas(area);

    app.send_area = Some(send_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Message ");

    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (offset, cursor_column) = input_window(&app.session.draft, app.cursor, inner_width);

    let input = if app.session.draft.is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        let mut used = 0;
        let visible_text: String = app.session.draft
            .chars()
            .skip(offset)
            .take_while(|&c| {
                used += char_width(c);
                used <= inner_width
            })
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), input_area);

    let cursor_x = u16::try_from(cursor_column).unwrap_or(u16::MAX);
    frame.set_cursor_position((input_area.x.saturating_add(cursor_x).saturating_add(1), input_area.y + 1));

    let send_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let send = Paragraph::new(Line::from("Send").centered())
        .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .block(send_block);

    frame.render_widget(send, send_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled(" CHAT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        Span::raw(" Enter/Send: submit  PgUp/PgDn: scroll  Esc: quit "),
        Span::styled(app.client.endpoint().to_string(), Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(hints), area);
}
