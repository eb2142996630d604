use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use minefield::{cli, tui, Difficulty, GameConfig};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "minefield", about = "Minefield-clearing puzzle for the terminal", version)]
struct Args {
    /// Launch TUI mode
    #[arg(long)]
    tui: bool,
    /// Board preset; width/height/mines switch to custom
    #[arg(long, value_enum, default_value_t = Difficulty::Beginner)]
    difficulty: Difficulty,
    /// Board width (5-50)
    #[arg(long)]
    width: Option<usize>,
    /// Board height (5-30)
    #[arg(long)]
    height: Option<usize>,
    /// Number of mines
    #[arg(long)]
    mines: Option<usize>,
    /// Seed (0 = random)
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Write logs to this file (TUI mode logs nothing without it)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let custom = self.width.is_some() || self.height.is_some() || self.mines.is_some();
        if custom || self.difficulty == Difficulty::Custom {
            Difficulty::custom(self.width, self.height, self.mines)
        } else {
            self.difficulty.config()
        }
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn init_logging(args: &Args) -> io::Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(args.log_level());
    match &args.log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if !args.tui => builder.with_writer(io::stderr).init(),
        None => {}
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Cannot open log file: {}", e);
    }

    let config = args.game_config();
    let result = if args.tui { tui::run_tui(config, args.seed) } else { cli::run(config, args.seed) };
    if let Err(e) = result {
        eprintln!("{} error: {}", if args.tui { "TUI" } else { "I/O" }, e);
    }
}
