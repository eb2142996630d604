//! Line-oriented front end: parses typed commands and prints the board.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::config::GameConfig;
use crate::engine::{CellView, GameEngine, Outcome};
use crate::timer::Timer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Reveal { row: usize, col: usize },
    Flag { row: usize, col: usize },
    Chord { row: usize, col: usize },
    NewGame,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'h' for help")]
    Unknown(String),
    #[error("usage: {0} x y")]
    MissingCoords(&'static str),
    #[error("invalid {axis} coordinate '{value}'")]
    InvalidCoord { axis: &'static str, value: String },
    #[error("coordinates are 1-based")]
    ZeroCoord,
}

/// Parses one input line. Coordinates are typed 1-based as column then row
/// and come back 0-based as `(row, col)`.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(head) = parts.first() else { return Err(CommandError::Empty) };
    match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Ok(Command::Quit),
        "h" | "help" => Ok(Command::Help),
        "n" | "new" => Ok(Command::NewGame),
        "r" | "reveal" => coords(&parts, "r").map(|(row, col)| Command::Reveal { row, col }),
        "f" | "flag" => coords(&parts, "f").map(|(row, col)| Command::Flag { row, col }),
        "c" | "chord" => coords(&parts, "c").map(|(row, col)| Command::Chord { row, col }),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn coords(parts: &[&str], usage: &'static str) -> Result<(usize, usize), CommandError> {
    let [_, x, y, ..] = parts else { return Err(CommandError::MissingCoords(usage)) };
    let x = coord(x, "x")?;
    let y = coord(y, "y")?;
    Ok((y - 1, x - 1))
}

fn coord(value: &str, axis: &'static str) -> Result<usize, CommandError> {
    let n = value
        .parse::<usize>()
        .map_err(|_| CommandError::InvalidCoord { axis, value: value.to_string() })?;
    if n == 0 {
        return Err(CommandError::ZeroCoord);
    }
    Ok(n)
}

pub fn face(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Playing => "🙂",
        Outcome::Won => "😎",
        Outcome::Lost => "💀",
    }
}

pub fn glyph(view: CellView) -> char {
    match view {
        CellView::Hidden => '.',
        CellView::Flagged => 'F',
        CellView::Revealed(0) => ' ',
        CellView::Revealed(n) => char::from_digit(u32::from(n), 10).unwrap_or('?'),
        CellView::Mine => '*',
        CellView::TriggeredMine => 'X',
    }
}

/// Status line plus the grid with 1-based column and row labels.
pub fn render<T: Timer>(engine: &GameEngine<T>) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "Mines {:03}   {}   Time {:03}",
        engine.remaining_flags(),
        face(engine.outcome()),
        engine.elapsed_secs().min(999)
    );

    s.push_str("    ");
    for col in 0..engine.width() {
        let _ = write!(s, "{:>2} ", col + 1);
    }
    s.push('\n');
    s.push_str("   ");
    s.push_str(&"-".repeat(engine.width() * 3 + 1));
    s.push('\n');

    for row in 0..engine.height() {
        let _ = write!(s, "{:>2} | ", row + 1);
        for col in 0..engine.width() {
            let ch = engine.cell_view(row, col).map_or('?', glyph);
            let _ = write!(s, "{}  ", ch);
        }
        s.push('\n');
    }
    s
}

fn print_help() {
    println!("Commands:");
    println!("  r x y   - reveal cell at column x, row y (1-based)");
    println!("  f x y   - toggle flag at x, y");
    println!("  c x y   - chord: open the neighbours of a satisfied number");
    println!("  n       - new game");
    println!("  q       - quit");
    println!("  h/help  - show this help");
}

pub fn run(config: GameConfig, seed: u64) -> io::Result<()> {
    let mut engine = GameEngine::new(config).seeded(seed);
    let config = engine.config();

    println!("Minefield {}{}", config, if seed != 0 { format!(" (seed {})", seed) } else { String::new() });
    println!("Coordinates are 1-based. Type 'h' for help.");
    print_help();

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        println!("\n{}", render(&engine));
        if engine.is_finished() {
            match engine.outcome() {
                Outcome::Lost => println!("Boom! You hit a mine."),
                _ => println!("Congratulations! You cleared the board!"),
            }
            println!("'n' for a new game, 'q' to quit.");
        }

        print!("> ");
        io::stdout().flush()?;
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => print_help(),
            Ok(Command::NewGame) => engine.new_game(config),
            Ok(Command::Reveal { row, col }) => {
                engine.reveal(row, col);
            }
            Ok(Command::Flag { row, col }) => {
                if !engine.toggle_flag(row, col) {
                    println!("Cannot flag that cell");
                }
            }
            Ok(Command::Chord { row, col }) => {
                if !engine.chord(row, col).changed() {
                    println!("Nothing to chord there");
                }
            }
            Err(e) => println!("{}", e),
        }
    }
    Ok(())
}
