pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use typequote::{history::HistorySummary, time_series::history_series, CharState};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.round.session();

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let text = app.round.text();
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let mut prompt_occupied_lines =
        ((text.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;

    if text.width() <= max_chars_per_line as usize {
        prompt_occupied_lines = 1;
    }

    let status_lines = 2;
    let padding = area.height.saturating_sub(prompt_occupied_lines + status_lines) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(status_lines),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Length(padding),
        ])
        .split(area);

    // pure projection of the per-character states
    let spans = session
        .text()
        .iter()
        .zip(session.char_states())
        .enumerate()
        .map(|(idx, (&c, state))| match state {
            CharState::Correct => Span::styled(c.to_string(), green_bold_style),
            CharState::Incorrect => Span::styled(
                match c {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            CharState::Untouched if idx == session.cursor() => {
                Span::styled(c.to_string(), underlined_dim_bold_style)
            }
            CharState::Untouched => Span::styled(c.to_string(), dim_bold_style),
        })
        .collect::<Vec<Span>>();

    let widget = Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            // when the prompt is small enough to fit on one line
            // centering the text gives a nice zen feeling
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });

    widget.render(chunks[2], buf);

    let live = session.score();
    let status = match session.seconds_remaining() {
        Some(secs) => format!("{secs}s   {} wpm   {}% acc", live.wpm, live.accuracy),
        None => format!("{} wpm   {}% acc", live.wpm, live.accuracy),
    };
    Paragraph::new(Span::styled(status, dim_bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // final score
            Constraint::Length(1), // history summary
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let (wpm_points, accuracy_points) = history_series(&app.history);
    let (runs, highest) = charting::compute_chart_params(&wpm_points, &accuracy_points);

    let wpm_data: Vec<(f64, f64)> = wpm_points.iter().map(|&p| p.into()).collect();
    let accuracy_data: Vec<(f64, f64)> = accuracy_points.iter().map(|&p| p.into()).collect();
    let datasets = vec![
        Dataset::default()
            .name("wpm")
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&wpm_data),
        Dataset::default()
            .name("acc %")
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::Cyan))
            .graph_type(GraphType::Line)
            .data(&accuracy_data),
    ];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("runs")
                .bounds([0.0, runs])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(runs), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, highest])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    if let Some(score) = app.round.result() {
        Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {}s",
                score.wpm,
                score.accuracy,
                app.round.session().elapsed_seconds()
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    }

    if let Some(summary) = HistorySummary::from_records(&app.history) {
        Paragraph::new(Span::styled(
            format!(
                "last {}: avg {:.0} wpm (sd {:.1})   best {} wpm   avg {:.0}% acc",
                summary.count,
                summary.mean_wpm,
                summary.wpm_std_dev,
                summary.best_wpm,
                summary.mean_accuracy
            ),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled("(r)etry / (n)ew / (esc)ape", italic_style)).render(chunks[4], buf);
}
