use itertools::Itertools;
use keystride::analysis::{categorize, display_char, ErrorAnalysis, ErrorCategory};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};

use crate::App;

/// Share of errors above which a character is flagged red.
const HOT_SHARE: f64 = 25.0;

pub fn present_row(analysis: &ErrorAnalysis, character: char, count: usize) -> Row<'static> {
    let share = analysis.share_of(character);
    let share_color = if share >= HOT_SHARE {
        Color::Red
    } else {
        Color::Yellow
    };

    Row::new(vec![
        Cell::from(display_char(character)).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(count.to_string()),
        Cell::from(format!("{share:.1}")).style(Style::default().fg(share_color)),
        Cell::from(categorize(character).to_string()),
    ])
}

fn category_line(analysis: &ErrorAnalysis) -> Line<'static> {
    let mut spans = Vec::new();
    for category in ErrorCategory::ALL {
        let count = analysis.category_errors.get(&category).copied().unwrap_or(0);
        let style = if Some(category) == analysis.weakest_category {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("{category} {count}"), style));
        spans.push(Span::raw("   "));
    }
    spans.pop();
    Line::from(spans)
}

/// Error patterns and practice suggestions for the finished session
pub fn render_analysis(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(9), // top characters
            Constraint::Min(0),    // exercises
            Constraint::Length(2), // instructions
        ])
        .split(area);

    let Some(outcome) = app.trainer.outcome() else {
        Paragraph::new("Finish a test to see its error analysis.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(area, buf);
        return;
    };
    let analysis = &outcome.analysis;

    Paragraph::new(category_line(analysis))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Error analysis ({} errors)", analysis.total_errors)),
        )
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if analysis.top_characters.is_empty() {
        Paragraph::new("No errors this time.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Green))
            .render(chunks[1], buf);
    } else {
        let header = Row::new(vec![
            Cell::from("Char"),
            Cell::from("Errors"),
            Cell::from("Share (%)"),
            Cell::from("Category"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows = analysis
            .top_characters
            .iter()
            .map(|&(c, n)| present_row(analysis, c, n))
            .collect::<Vec<_>>();

        let widths = [
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Min(10),
        ];

        Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Top characters"))
            .column_spacing(2)
            .render(chunks[1], buf);
    }

    let exercises = analysis
        .exercises
        .iter()
        .map(|ex| {
            vec![
                Line::from(Span::styled(
                    ex.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    ex.description.clone(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
                Line::from(ex.text.clone()),
                Line::default(),
            ]
        })
        .concat();

    Paragraph::new(exercises)
        .block(Block::default().borders(Borders::ALL).title("Practice"))
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let heat = analysis
        .heatmap
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1))
        .map(|(c, n)| format!("{}:{n}", display_char(*c)))
        .join(" ");
    Paragraph::new(vec![
        Line::from(Span::styled(heat, Style::default().fg(Color::Magenta))),
        Line::from("(b/backspace) back  (r) retry  (n) new  (esc) quit"),
    ])
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}
