use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use tracing::debug;

use crate::cli::{face, glyph};
use crate::config::{Difficulty, GameConfig};
use crate::engine::{CellView, GameEngine, Outcome};

const DOUBLE_CLICK: Duration = Duration::from_millis(400);

pub fn run_tui(config: GameConfig, seed: u64) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    let _guard = TermGuard;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut config = config;
    let mut engine = GameEngine::new(config).seeded(seed);
    // (row, col)
    let mut cursor = (0usize, 0usize);
    let mut last_click: Option<((usize, usize), Instant)> = None;
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(250);
    let autodemo = std::env::var("MINEFIELD_TUI_AUTODEMO").is_ok();
    let mut demo_step = 0usize;

    let mut last_inner_board = Rect::default();
    let res = loop {
        terminal.draw(|f| {
            last_inner_board = ui(f, &engine, cursor);
        })?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                    KeyCode::Char('h') | KeyCode::Left => cursor.1 = cursor.1.saturating_sub(1),
                    KeyCode::Char('l') | KeyCode::Right => {
                        if cursor.1 + 1 < engine.width() {
                            cursor.1 += 1;
                        }
                    }
                    KeyCode::Char('k') | KeyCode::Up => cursor.0 = cursor.0.saturating_sub(1),
                    KeyCode::Char('j') | KeyCode::Down => {
                        if cursor.0 + 1 < engine.height() {
                            cursor.0 += 1;
                        }
                    }
                    KeyCode::Char('f') => {
                        engine.toggle_flag(cursor.0, cursor.1);
                    }
                    KeyCode::Char('c') => {
                        engine.chord(cursor.0, cursor.1);
                    }
                    KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => {
                        engine.reveal(cursor.0, cursor.1);
                    }
                    KeyCode::Char('n') => engine.new_game(config),
                    KeyCode::Char(d @ '1'..='3') => {
                        config = match d {
                            '1' => Difficulty::Beginner,
                            '2' => Difficulty::Intermediate,
                            _ => Difficulty::Expert,
                        }
                        .config();
                        engine.new_game(config);
                        cursor = (cursor.0.min(config.height - 1), cursor.1.min(config.width - 1));
                    }
                    _ => {}
                },
                Event::Mouse(m) => {
                    if let MouseEventKind::Down(btn) = m.kind {
                        if let Some(cell) = pos_to_cell(m.column, m.row, last_inner_board, engine.width(), engine.height()) {
                            cursor = cell;
                            match btn {
                                MouseButton::Left => {
                                    let double = last_click
                                        .is_some_and(|(prev, at)| prev == cell && at.elapsed() <= DOUBLE_CLICK);
                                    if double {
                                        engine.chord(cell.0, cell.1);
                                        last_click = None;
                                    } else {
                                        engine.reveal(cell.0, cell.1);
                                        last_click = Some((cell, Instant::now()));
                                    }
                                }
                                MouseButton::Right => {
                                    engine.toggle_flag(cell.0, cell.1);
                                }
                                MouseButton::Middle => {
                                    engine.chord(cell.0, cell.1);
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            if autodemo {
                let center = (engine.height() / 2, engine.width() / 2);
                match demo_step {
                    0 => {
                        engine.reveal(center.0, center.1);
                        cursor = center;
                    }
                    1 => {
                        engine.toggle_flag(0, 0);
                    }
                    2 => {
                        engine.chord(center.0, center.1);
                    }
                    3 => {}
                    _ => break Ok(()),
                }
                debug!(step = demo_step, state = ?engine.state(), "autodemo");
                demo_step += 1;
            }
        }
    };

    terminal.show_cursor()?;
    res
}

fn ui(f: &mut ratatui::Frame, engine: &GameEngine, cursor: (usize, usize)) -> Rect {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
        .split(f.size());

    let status = format!(
        "Mines {:03}   {}   Time {:03}",
        engine.remaining_flags(),
        face(engine.outcome()),
        engine.elapsed_secs().min(999)
    );
    let status_style = match engine.outcome() {
        Outcome::Playing => Style::default().fg(Color::Cyan),
        Outcome::Won => Style::default().fg(Color::Green),
        Outcome::Lost => Style::default().fg(Color::Red),
    };
    let header = Paragraph::new(status)
        .style(status_style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Minefield"));
    f.render_widget(header, root[0]);

    let area = centered_grid_area(root[1], engine.width() as u16, engine.height() as u16);
    draw_board(f, engine, area, cursor);

    let help = match engine.outcome() {
        Outcome::Playing => "left=reveal right=flag middle/double=chord • arrows/HJKL move • space reveal • f flag • c chord • n new • 1-3 preset • q quit",
        Outcome::Won => "You cleared the board! n new game • 1-3 preset • q quit",
        Outcome::Lost => "Boom! n new game • 1-3 preset • q quit",
    };
    let footer = Paragraph::new(format!("{}  |  {}", engine.config(), help))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, root[2]);
    inner_area(area)
}

/// Board rectangle including its border, centred in `parent`.
fn centered_grid_area(parent: Rect, cols: u16, rows: u16) -> Rect {
    let grid_w = cols * 2 + 2;
    let grid_h = rows + 2;
    let x = parent.x.saturating_add(parent.width.saturating_sub(grid_w) / 2);
    let y = parent.y.saturating_add(parent.height.saturating_sub(grid_h) / 2);
    Rect { x, y, width: grid_w.min(parent.width), height: grid_h.min(parent.height) }
}

fn draw_board(f: &mut ratatui::Frame, engine: &GameEngine, area: Rect, cursor: (usize, usize)) {
    let mut lines: Vec<Line> = Vec::with_capacity(engine.height());
    for row in 0..engine.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(engine.width());
        for col in 0..engine.width() {
            let view = engine.cell_view(row, col).unwrap_or(CellView::Hidden);
            let mut ch = match view {
                CellView::Hidden => '·',
                other => glyph(other),
            };
            let mut style = match view {
                CellView::Hidden => Style::default().fg(Color::DarkGray),
                CellView::Flagged => Style::default().fg(Color::Yellow),
                CellView::Revealed(n) => number_style(n),
                CellView::Mine => Style::default().fg(Color::Red),
                CellView::TriggeredMine => Style::default().fg(Color::White).bg(Color::Red),
            };

            if cursor == (row, col) {
                style = style.add_modifier(Modifier::REVERSED);
                if ch == ' ' {
                    ch = '·';
                }
            }

            spans.push(Span::styled(format!("{} ", ch), style));
        }
        lines.push(Line::from(spans));
    }

    let para = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Board"));
    f.render_widget(para, area);
}

fn number_style(n: u8) -> Style {
    match n {
        0 => Style::default().fg(Color::Gray),
        1 => Style::default().fg(Color::Blue),
        2 => Style::default().fg(Color::Green),
        3 => Style::default().fg(Color::Red),
        4 => Style::default().fg(Color::Magenta),
        5 => Style::default().fg(Color::Yellow),
        6 => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    }
}

// Same as Block::inner() for Borders::ALL.
fn inner_area(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

/// Maps a terminal position to `(row, col)`. Each cell is two columns wide.
fn pos_to_cell(mx: u16, my: u16, inner: Rect, cols: usize, rows: usize) -> Option<(usize, usize)> {
    if mx < inner.x || my < inner.y {
        return None;
    }
    let col = usize::from((mx - inner.x) / 2);
    let row = usize::from(my - inner.y);
    (col < cols && row < rows).then_some((row, col))
}

struct TermGuard;

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(DisableMouseCapture);
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}
