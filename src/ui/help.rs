use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Key bindings, in the order a first test meets them.
pub const KEYS: [(&str, &str); 8] = [
    ("any key", "start typing; the clock starts on the first character"),
    ("tab", "change the test length before starting"),
    ("backspace", "erase the last character"),
    ("←", "retry the same text"),
    ("→", "new text"),
    ("r / n", "retry / new text from the results"),
    ("a", "error analysis from the results"),
    ("esc", "quit"),
];

fn key_line(key: &str, action: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{key:>10}  "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(action.to_string()),
    ])
}

/// First-run key overview; any key dismisses it
pub fn render_help(area: Rect, buf: &mut Buffer) {
    let height = KEYS.len() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    let lines = KEYS
        .iter()
        .map(|(key, action)| key_line(key, action))
        .collect::<Vec<_>>();

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Keys"))
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "press any key to begin (F1 shows this again)",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}
