//! Minefield-clearing puzzle engine.
//!
//! [`GameEngine`] owns one game session and understands three player actions:
//! reveal, toggle a flag, and chord. Front ends translate their input into
//! these calls and render from [`GameEngine::cell_view`] and the counters.
//!
//! ```
//! use minefield::{GameConfig, GameEngine, GameState};
//!
//! let mut game = GameEngine::new(GameConfig::new(9, 9, 10)).seeded(42);
//! game.reveal(4, 4);
//! assert_ne!(game.state(), GameState::Lost);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod timer;
pub mod tui;

pub use config::{Difficulty, GameConfig};
pub use engine::{Cell, CellView, GameEngine, GameState, Outcome, RevealResult};
pub use timer::{NoTimer, Stopwatch, Timer};
