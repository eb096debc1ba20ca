pub mod analysis;
pub mod charting;
pub mod help;
pub mod screen;

use keystride::session::Session;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.state).render(app, f);
}

/// Colored prompt: typed chars against the reference, cursor, then the rest.
fn prompt_spans(session: &Session) -> Vec<Span<'static>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let reference = session.reference();
    let mut spans = session
        .input()
        .iter()
        .enumerate()
        .map(|(idx, &typed)| match session.expected_char(idx) {
            Some(expected) if expected == typed => {
                Span::styled(expected.to_string(), green_bold_style)
            }
            _ => Span::styled(
                match typed {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
        })
        .collect::<Vec<Span>>();

    let cursor = session.cursor_position();
    if let Some(c) = session.expected_char(cursor) {
        spans.push(Span::styled(c.to_string(), underlined_dim_bold_style));
    }
    if cursor + 1 < reference.len() {
        spans.push(Span::styled(
            reference[cursor + 1..].iter().collect::<String>(),
            dim_bold_style,
        ));
    }
    spans
}

impl App {
    fn render_typing(&self, area: Rect, buf: &mut Buffer) {
        let session = self.trainer.session();
        let dim_bold_style = Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::DIM);

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let prompt_width = session.reference_text().width();
        let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
            1
        } else {
            ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
        };
        let padding = area.height.saturating_sub(prompt_occupied_lines) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(padding.saturating_sub(2)),
                Constraint::Length(2),
                Constraint::Length(prompt_occupied_lines),
                Constraint::Length(padding),
            ])
            .split(area);

        let status = if session.has_started() {
            let typing = if self.trainer.is_typing(self.now) {
                ""
            } else {
                "   paused"
            };
            format!(
                "{}   {:.0} wpm   {:.0}% acc{typing}",
                self.trainer.remaining_secs(self.now),
                session.wpm(),
                session.accuracy()
            )
        } else {
            format!("{}   (tab) change duration", self.trainer.duration())
        };
        Paragraph::new(Span::styled(status, dim_bold_style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(Line::from(prompt_spans(session)))
            .alignment(if prompt_occupied_lines == 1 {
                // when the prompt is small enough to fit on one line
                // centering the text gives a nice zen feeling
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);
    }

    fn render_results(&self, area: Rect, buf: &mut Buffer) {
        let session = self.trainer.session();
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let magenta_style = Style::default().fg(Color::Magenta);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(1),    // chart
                Constraint::Length(1), // headline stats
                Constraint::Length(1), // secondary stats
                Constraint::Length(1), // character counts
                Constraint::Length(1), // history
                Constraint::Length(1), // unsaved note
                Constraint::Length(1), // legend
            ])
            .split(area);

        let points = session.samples().wpm_points();
        let (overall_duration, highest_wpm) =
            charting::compute_chart_params(&points, self.trainer.duration().secs() as f64);

        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(magenta_style)
            .graph_type(GraphType::Line)
            .data(&points)];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, overall_duration])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(charting::format_label(overall_duration), bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, highest_wpm])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(charting::format_label(highest_wpm), bold_style),
                    ]),
            )
            .render(chunks[0], buf);

        let Some(summary) = session.summary() else {
            return;
        };

        Paragraph::new(Span::styled(
            format!(
                "{:.0} wpm   {:.0}% acc   {}% consistency",
                summary.wpm, summary.accuracy, summary.consistency
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(format!(
            "peak {:.0} wpm   avg {:.0} wpm   {}s",
            summary.peak_wpm, summary.average_wpm, summary.elapsed_secs
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        let chars = summary.char_stats;
        Paragraph::new(format!(
            "characters {}/{}/{}/{}   (correct/incorrect/fixed/unfixed)",
            chars.correct, chars.error, chars.fixed, chars.unfixed
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

        let stats = &self.history_stats;
        Paragraph::new(Span::styled(
            format!(
                "{} tests   avg {:.0} wpm   best {:.0} wpm   trend {:+.1}",
                stats.total_tests, stats.avg_wpm, stats.max_wpm, stats.recent_improvement
            ),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        let unsaved = if !self.trainer.storage().is_persistent() {
            Some("memory only, not saved")
        } else if self.trainer.outcome().is_some_and(|o| !o.saved) {
            Some("not saved")
        } else {
            None
        };
        if let Some(note) = unsaved {
            Paragraph::new(Span::styled(note, Style::default().fg(Color::Red)))
                .alignment(Alignment::Center)
                .render(chunks[5], buf);
        }

        Paragraph::new(Span::styled(
            "(r)etry / (n)ew / (a)nalysis / (esc)ape",
            italic_style,
        ))
        .render(chunks[6], buf);
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Help => help::render_help(area, buf),
            AppState::Typing => self.render_typing(area, buf),
            AppState::Results | AppState::Analysis => self.render_results(area, buf),
        }
    }
}
