use std::fmt;

pub const MIN_WIDTH: usize = 5;
pub const MAX_WIDTH: usize = 50;
pub const MIN_HEIGHT: usize = 5;
pub const MAX_HEIGHT: usize = 30;

/// Grid dimensions and mine count for one game.
///
/// Constructing through [`GameConfig::new`] always yields a playable board:
/// width in `5..=50`, height in `5..=30` and at least one safe cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

impl GameConfig {
    pub fn new(width: usize, height: usize, mines: usize) -> Self {
        Self { width, height, mines }.clamped()
    }

    /// Pulls every field back into its valid range. The mine bound depends on
    /// the clamped dimensions, so those are fixed first.
    pub fn clamped(self) -> Self {
        let width = self.width.clamp(MIN_WIDTH, MAX_WIDTH);
        let height = self.height.clamp(MIN_HEIGHT, MAX_HEIGHT);
        let mines = self.mines.clamp(1, width * height - 1);
        Self { width, height, mines }
    }

    pub fn is_valid(&self) -> bool {
        *self == self.clamped()
    }

    pub fn total_cells(&self) -> usize {
        self.width * self.height
    }

    pub fn safe_cells(&self) -> usize {
        self.total_cells() - self.mines
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Difficulty::Beginner.config()
    }
}

impl fmt::Display for GameConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} with {} mines", self.width, self.height, self.mines)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

impl Difficulty {
    pub const CUSTOM_WIDTH: usize = 10;
    pub const CUSTOM_HEIGHT: usize = 10;
    pub const CUSTOM_MINES: usize = 15;

    /// Preset dimensions. `Custom` falls back to its own defaults; use
    /// [`Difficulty::custom`] to supply values.
    pub fn config(self) -> GameConfig {
        match self {
            Difficulty::Beginner => GameConfig::new(9, 9, 10),
            Difficulty::Intermediate => GameConfig::new(16, 16, 40),
            Difficulty::Expert => GameConfig::new(30, 16, 99),
            Difficulty::Custom => Self::custom(None, None, None),
        }
    }

    pub fn custom(width: Option<usize>, height: Option<usize>, mines: Option<usize>) -> GameConfig {
        GameConfig::new(
            width.unwrap_or(Self::CUSTOM_WIDTH),
            height.unwrap_or(Self::CUSTOM_HEIGHT),
            mines.unwrap_or(Self::CUSTOM_MINES),
        )
    }
}
