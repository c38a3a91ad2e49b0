pub mod rate_board;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};
use ratecatch::{celebration::Celebration, sequence::format_rate};

use crate::App;
use rate_board::RateBoard;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

/// Splits the screen into the main panel and the rate board.
pub fn columns(area: Rect) -> (Rect, Rect) {
    let board_width = RateBoard::preferred_width().min(area.width / 2);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(20), Constraint::Length(board_width)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Where the new-best burst starts: the best value on the rate board.
pub fn best_anchor(area: Rect) -> (u16, u16) {
    let (_, board) = columns(area);
    (board.x + board.width / 2, board.y + 2)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let engine = &self.engine;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().fg(Color::Gray).add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let (main, board) = columns(area);

        let banner_lines = if engine.caught().is_some() { 3 } else { 0 };
        let content_height = 1 + 1 + 5 + 1 + banner_lines + 1 + 1;
        let spare = main.height.saturating_sub(content_height) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(spare),
                Constraint::Length(1),            // title
                Constraint::Length(1),            // padding
                Constraint::Length(5),            // current rate
                Constraint::Length(1),            // status
                Constraint::Length(banner_lines), // caught banner
                Constraint::Length(1),            // padding
                Constraint::Length(1),            // hint
                Constraint::Min(0),
            ])
            .split(main);

        Paragraph::new(Span::styled(
            "Catch The Rate",
            bold_style.fg(Color::LightBlue),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        let rate_width = 24.min(chunks[3].width);
        let rate_area = Rect {
            x: chunks[3].x + (chunks[3].width - rate_width) / 2,
            width: rate_width,
            ..chunks[3]
        };
        let rate_style = if engine.is_running() {
            bold_style.fg(Color::White)
        } else {
            bold_style.fg(Color::LightGreen)
        };
        Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(format_rate(engine.active_value()), rate_style)),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(dim_style),
        )
        .render(rate_area, buf);

        let status = if engine.is_running() {
            "Press ENTER to catch!"
        } else {
            "Rate Caught!"
        };
        Paragraph::new(Span::styled(status, Style::default().fg(Color::Gray)))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        if let Some(caught) = engine.caught() {
            let mut spans = vec![Span::styled(
                format!("You caught: {}", format_rate(caught.value)),
                bold_style.fg(Color::LightGreen),
            )];
            if caught.new_best {
                spans.push(Span::styled("  NEW BEST!", bold_style.fg(Color::Yellow)));
            }
            Paragraph::new(Line::from(spans))
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Green)),
                )
                .render(chunks[5], buf);
        }

        let hint = if engine.is_running() {
            "(enter) catch / (esc)ape"
        } else {
            "(r)etry / (esc)ape"
        };
        Paragraph::new(Span::styled(hint, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[7], buf);

        RateBoard::new(engine).render(board, buf);

        if self.celebration.is_active {
            render_sparks(&self.celebration, area, buf);
        }
    }
}

fn render_sparks(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::LightYellow,
        Color::Magenta,
        Color::Cyan,
        Color::LightGreen,
        Color::White,
    ];

    for spark in &celebration.sparks {
        let (x, y) = (spark.x as u16, spark.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }
        let color = colors[spark.color_index % colors.len()];
        let style = match spark.life_left() {
            life if life > 0.6 => Style::default().fg(color).add_modifier(Modifier::BOLD),
            life if life > 0.25 => Style::default().fg(color),
            _ => Style::default().fg(color).add_modifier(Modifier::DIM),
        };
        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&spark.symbol.to_string());
            cell.set_style(style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use ratecatch::{
        config::{Config, RateSource},
        storage::MemoryStore,
        SelectionPolicy,
    };

    fn test_app(values: Vec<f64>, store: &MemoryStore) -> App {
        let config = Config {
            policy: SelectionPolicy::Sequential,
            rates: RateSource::Listed { values },
            ..Config::default()
        };
        App::new(&config, Box::new(store.clone())).unwrap()
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn running_screen_shows_prompt_and_rate() {
        let app = test_app(vec![0.1, 0.5, 1.0], &MemoryStore::new());
        let content = render(&app, 100, 30);
        assert!(content.contains("Catch The Rate"));
        assert!(content.contains("Press ENTER to catch!"));
        assert!(content.contains("$ 0.1"));
        assert!(!content.contains("You caught"));
    }

    #[test]
    fn stopped_screen_shows_banner_and_best() {
        let mut app = test_app(vec![0.1, 0.5, 1.0], &MemoryStore::new());
        app.on_tick();
        app.catch(std::time::Instant::now(), Rect::new(0, 0, 100, 30));

        let content = render(&app, 100, 30);
        assert!(content.contains("Rate Caught!"));
        assert!(content.contains("You caught: $ 0.5"));
        assert!(content.contains("NEW BEST!"));
        assert!(content.contains("Highest Caught"));
        assert!(content.contains("(r)etry"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let classic = ratecatch::RateSequence::classic().values().to_vec();
        let app = test_app(classic, &MemoryStore::new());
        render(&app, 10, 4);
        render(&app, 1, 1);
    }

    #[test]
    fn best_anchor_lies_on_the_board() {
        let area = Rect::new(0, 0, 100, 30);
        let (_, board) = columns(area);
        let (x, y) = best_anchor(area);
        assert!(x >= board.x && x < board.x + board.width);
        assert!(y >= board.y && y < board.y + board.height);
    }

    #[test]
    fn sparks_render_inside_the_area() {
        let mut app = test_app(vec![1.0], &MemoryStore::new());
        app.celebration.start(5, 5, 100, 30);
        let content = render(&app, 100, 30);
        assert!(content.contains("Catch The Rate"));
    }
}
