use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};
use ratecatch::{sequence::format_rate, RateGameEngine};
use unicode_width::UnicodeWidthStr;

const COLUMNS: u16 = 4;
const CELL_PADDING: usize = 2;
/// "$ 10.5" is the widest rate the board expects to lay out evenly.
const TYPICAL_RATE: &str = "$ 10.5";

/// Right-hand panel: the highest caught rate and every rate in the
/// sequence, with the active and caught ones highlighted.
pub struct RateBoard<'a> {
    engine: &'a RateGameEngine,
}

impl<'a> RateBoard<'a> {
    pub fn new(engine: &'a RateGameEngine) -> Self {
        Self { engine }
    }

    fn cell_width() -> usize {
        TYPICAL_RATE.width() + CELL_PADDING
    }

    pub fn preferred_width() -> u16 {
        // borders + padding on both sides
        COLUMNS * Self::cell_width() as u16 + 4
    }

    fn cell_style(&self, idx: usize) -> Style {
        let engine = self.engine;
        if engine.caught_index() == Some(idx) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else if engine.is_running() && engine.active_index() == idx {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Gray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        }
    }

    fn rate_lines(&self, inner_width: u16) -> Vec<Line<'static>> {
        let cell = Self::cell_width();
        let per_row = (inner_width as usize / cell).max(1);
        self.engine
            .sequence()
            .values()
            .iter()
            .enumerate()
            .chunks(per_row)
            .into_iter()
            .map(|row| {
                let spans = row
                    .map(|(idx, rate)| {
                        Span::styled(format!("{:^cell$}", format_rate(*rate)), self.cell_style(idx))
                    })
                    .collect::<Vec<_>>();
                Line::from(spans)
            })
            .collect()
    }
}

impl Widget for RateBoard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Rates ");
        let inner = block.inner(area);
        block.render(area, buf);

        let best_height = if self.engine.best_value().is_some() { 3 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(1)
            .constraints([Constraint::Length(best_height), Constraint::Min(0)])
            .split(inner);

        if let Some(best) = self.engine.best_value() {
            Paragraph::new(vec![
                Line::from(Span::styled(
                    "🏆 Highest Caught",
                    Style::default().fg(Color::White),
                )),
                Line::from(Span::styled(
                    format_rate(best),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
            ])
            .alignment(Alignment::Center)
            .render(chunks[0], buf);
        }

        Paragraph::new(self.rate_lines(chunks[1].width)).render(chunks[1], buf);
    }
}
