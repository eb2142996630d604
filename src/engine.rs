use std::ops::BitOr;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::config::GameConfig;
use crate::timer::{Stopwatch, Timer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    AwaitingFirstReveal,
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub fn is_finished(self) -> bool {
        matches!(self, GameState::Won | GameState::Lost)
    }

    pub fn outcome(self) -> Outcome {
        match self {
            GameState::AwaitingFirstReveal | GameState::Playing => Outcome::Playing,
            GameState::Won => Outcome::Won,
            GameState::Lost => Outcome::Lost,
        }
    }
}

/// What a renderer shows in its status chrome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Playing,
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealResult {
    NoOp,
    RevealedSafe,
    HitMine,
    Won,
}

impl RevealResult {
    pub fn changed(self) -> bool {
        self != RevealResult::NoOp
    }
}

/// Merges the results of a batch of reveals. A hit mine outranks a win, which
/// outranks a plain reveal.
impl BitOr for RevealResult {
    type Output = RevealResult;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealResult::*;
        match (self, rhs) {
            (HitMine, _) | (_, HitMine) => HitMine,
            (Won, _) | (_, Won) => Won,
            (RevealedSafe, _) | (_, RevealedSafe) => RevealedSafe,
            (NoOp, NoOp) => NoOp,
        }
    }
}

/// Per-cell state as a renderer is allowed to see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Flagged,
    Revealed(u8),
    Mine,
    /// The mine whose reveal lost the game.
    TriggeredMine,
}

#[derive(Clone, Debug, Default)]
pub struct Cell {
    is_mine: bool,
    adjacent: u8,
    revealed: bool,
    flagged: bool,
}

impl Cell {
    pub fn is_mine(&self) -> bool {
        self.is_mine
    }

    /// Mines among the neighbours, or `None` for a mine cell.
    pub fn adjacent_mines(&self) -> Option<u8> {
        (!self.is_mine).then_some(self.adjacent)
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn flagged(&self) -> bool {
        self.flagged
    }
}

/// One game session: grid, mine layout, counters, state machine and timer.
///
/// Mines are placed lazily on the first reveal so that the clicked cell and
/// its neighbours are always safe. Every action is total: input that makes no
/// sense in the current state is ignored and reported as a no-op.
pub struct GameEngine<T: Timer = Stopwatch> {
    config: GameConfig,
    cells: Vec<Cell>,
    state: GameState,
    mines_placed: bool,
    revealed: usize,
    flags: usize,
    triggered_mine: Option<(usize, usize)>,
    timer: T,
    rng: ChaCha8Rng,
}

impl GameEngine<Stopwatch> {
    pub fn new(config: GameConfig) -> Self {
        Self::with_timer(config, Stopwatch::default())
    }
}

impl<T: Timer> GameEngine<T> {
    pub fn with_timer(config: GameConfig, timer: T) -> Self {
        let mut engine = Self {
            config,
            cells: Vec::new(),
            state: GameState::AwaitingFirstReveal,
            mines_placed: false,
            revealed: 0,
            flags: 0,
            triggered_mine: None,
            timer,
            rng: ChaCha8Rng::from_entropy(),
        };
        engine.new_game(config);
        engine
    }

    /// Makes mine placement reproducible. A seed of 0 keeps the entropy source.
    pub fn seeded(mut self, seed: u64) -> Self {
        if seed != 0 {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self
    }

    /// Replaces random placement with a fixed layout for the current game.
    ///
    /// Coordinates are `(row, col)`; out-of-range and duplicate entries are
    /// ignored. The mine count becomes the number of distinct mines placed.
    /// A layout with no mine or no safe cell is refused and the game keeps
    /// random placement. The next `new_game` goes back to random placement.
    pub fn with_mine_layout(mut self, mines: &[(usize, usize)]) -> Self {
        self.new_game(self.config);
        let mut mask = vec![false; self.config.total_cells()];
        for &(row, col) in mines {
            match self.index(row, col) {
                Some(i) => mask[i] = true,
                None => warn!(row, col, "ignoring mine outside the grid"),
            }
        }
        let count = mask.iter().filter(|&&m| m).count();
        if count == 0 || count == mask.len() {
            warn!(count, cells = mask.len(), "layout needs at least one mine and one safe cell, keeping random placement");
            return self;
        }

        for (cell, mine) in self.cells.iter_mut().zip(mask) { cell.is_mine = mine; }
        self.config.mines = count;
        self.mines_placed = true;
        self.compute_adjacency();
        debug!(mines = self.config.mines, "fixed mine layout installed");
        self
    }

    /// Throws the current session away and starts over with `config`.
    pub fn new_game(&mut self, config: GameConfig) {
        let clamped = config.clamped();
        if clamped != config {
            debug!(requested = %config, using = %clamped, "clamped game config");
        }
        self.config = clamped;
        self.cells = vec![Cell::default(); clamped.total_cells()];
        self.state = GameState::AwaitingFirstReveal;
        self.mines_placed = false;
        self.revealed = 0;
        self.flags = 0;
        self.triggered_mine = None;
        self.timer.stop();
        self.timer.reset();
        debug!(config = %clamped, "new game");
    }

    pub fn reveal(&mut self, row: usize, col: usize) -> RevealResult {
        if self.state.is_finished() { return RevealResult::NoOp; }
        let Some(i) = self.index(row, col) else { return RevealResult::NoOp };
        if self.cells[i].revealed || self.cells[i].flagged { return RevealResult::NoOp; }

        if self.state == GameState::AwaitingFirstReveal {
            self.begin(row, col);
        }
        if self.cells[i].is_mine {
            self.explode(row, col);
            return RevealResult::HitMine;
        }

        self.flood_reveal(row, col);
        if self.revealed == self.config.safe_cells() {
            self.finish(GameState::Won);
            RevealResult::Won
        } else {
            RevealResult::RevealedSafe
        }
    }

    /// Returns whether the flag changed. Flags are capped at the mine count.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> bool {
        if self.state.is_finished() { return false; }
        let Some(i) = self.index(row, col) else { return false };
        let cell = &mut self.cells[i];
        if cell.revealed { return false; }
        if !cell.flagged && self.flags >= self.config.mines { return false; }
        cell.flagged = !cell.flagged;
        if cell.flagged {
            self.flags += 1;
        } else {
            self.flags -= 1;
        }
        true
    }

    /// Reveals every hidden, unflagged neighbour of an opened number once the
    /// number of flags around it matches. Anything else is left untouched.
    pub fn chord(&mut self, row: usize, col: usize) -> RevealResult {
        if self.state != GameState::Playing { return RevealResult::NoOp; }
        let Some(i) = self.index(row, col) else { return RevealResult::NoOp };
        let cell = &self.cells[i];
        if !cell.revealed || cell.is_mine { return RevealResult::NoOp; }

        let flagged = self
            .neighbors(row, col)
            .filter(|&(r, c)| self.cells[r * self.config.width + c].flagged)
            .count();
        // Ambiguous unless the flags account for every adjacent mine
        if flagged != usize::from(cell.adjacent) { return RevealResult::NoOp; }

        let targets: Vec<(usize, usize)> = self
            .neighbors(row, col)
            .filter(|&(r, c)| {
                let n = &self.cells[r * self.config.width + c];
                !n.revealed && !n.flagged
            })
            .collect();
        targets
            .into_iter()
            .fold(RevealResult::NoOp, |acc, (r, c)| acc | self.reveal(r, c))
    }

    fn begin(&mut self, row: usize, col: usize) {
        if !self.mines_placed {
            self.place_mines(row, col);
        }
        self.state = GameState::Playing;
        self.timer.start();
    }

    fn place_mines(&mut self, row: usize, col: usize) {
        let total = self.config.total_cells();
        let clicked = row * self.config.width + col;
        // Opening area: the clicked cell and its neighbours stay mine-free
        let mut excluded: Vec<usize> = self.neighbors(row, col).map(|(r, c)| r * self.config.width + c).collect();
        excluded.push(clicked);

        // Too dense for a full opening; settle for a safe first click
        if self.config.mines > total - excluded.len() {
            warn!(
                mines = self.config.mines,
                free = total - excluded.len(),
                "mines do not fit outside the opening area, only the clicked cell is kept safe"
            );
            excluded = vec![clicked];
        }

        let candidates: Vec<usize> = (0..total).filter(|p| !excluded.contains(p)).collect();
        for &p in candidates.choose_multiple(&mut self.rng, self.config.mines) {
            self.cells[p].is_mine = true;
        }
        self.mines_placed = true;
        self.compute_adjacency();
        debug!(row, col, mines = self.config.mines, "mines placed");
    }

    fn compute_adjacency(&mut self) {
        let (w, h) = (self.config.width, self.config.height);
        for r in 0..h {
            for c in 0..w {
                let i = r * w + c;
                if self.cells[i].is_mine { continue; }
                let count = neighbors(w, h, r, c).filter(|&(nr, nc)| self.cells[nr * w + nc].is_mine).count();
                self.cells[i].adjacent = count as u8;
            }
        }
    }

    fn flood_reveal(&mut self, row: usize, col: usize) {
        let (w, h) = (self.config.width, self.config.height);
        let mut stack = vec![(row, col)];
        let mut opened = 0usize;
        while let Some((r, c)) = stack.pop() {
            let cell = &mut self.cells[r * w + c];
            // A cell may be pushed twice before it is opened
            if cell.revealed || cell.flagged || cell.is_mine { continue; }
            cell.revealed = true;
            self.revealed += 1;
            opened += 1;
            // Only empty cells spread to their neighbours
            if cell.adjacent == 0 {
                stack.extend(neighbors(w, h, r, c).filter(|&(nr, nc)| {
                    let n = &self.cells[nr * w + nc];
                    !n.revealed && !n.flagged && !n.is_mine
                }));
            }
        }
        trace!(row, col, opened, "flood reveal");
    }

    fn explode(&mut self, row: usize, col: usize) {
        for cell in self.cells.iter_mut().filter(|c| c.is_mine) {
            cell.revealed = true;
        }
        self.triggered_mine = Some((row, col));
        self.finish(GameState::Lost);
    }

    fn finish(&mut self, state: GameState) {
        self.state = state;
        self.timer.stop();
        info!(outcome = ?state, revealed = self.revealed, secs = self.timer.elapsed_secs(), "game over");
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.config.height && col < self.config.width).then(|| row * self.config.width + col)
    }
}

// Read-only state for renderers and controllers.
impl<T: Timer> GameEngine<T> {
    pub fn config(&self) -> GameConfig {
        self.config
    }
    pub fn width(&self) -> usize {
        self.config.width
    }
    pub fn height(&self) -> usize {
        self.config.height
    }
    pub fn mine_count(&self) -> usize {
        self.config.mines
    }
    pub fn state(&self) -> GameState {
        self.state
    }
    pub fn outcome(&self) -> Outcome {
        self.state.outcome()
    }
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
    pub fn revealed_count(&self) -> usize {
        self.revealed
    }
    pub fn flag_count(&self) -> usize {
        self.flags
    }
    pub fn remaining_flags(&self) -> usize {
        self.config.mines - self.flags
    }
    pub fn triggered_mine(&self) -> Option<(usize, usize)> {
        self.triggered_mine
    }
    pub fn timer(&self) -> &T {
        &self.timer
    }
    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    pub fn cell_view(&self, row: usize, col: usize) -> Option<CellView> {
        let cell = self.cell(row, col)?;
        Some(match (cell.revealed, cell.is_mine) {
            (true, true) if self.triggered_mine == Some((row, col)) => CellView::TriggeredMine,
            (true, true) => CellView::Mine,
            (true, false) => CellView::Revealed(cell.adjacent),
            (false, _) if cell.flagged => CellView::Flagged,
            (false, _) => CellView::Hidden,
        })
    }

    /// In-bounds neighbours of `(row, col)`, up to eight.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
        neighbors(self.config.width, self.config.height, row, col)
    }
}

const OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

fn neighbors(width: usize, height: usize, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> {
    OFFSETS.into_iter().filter_map(move |(dr, dc)| {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < height && c < width).then_some((r, c))
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::timer::NoTimer;

    #[derive(Clone, Default)]
    struct RecordingTimer(Rc<RefCell<Vec<&'static str>>>);

    impl Timer for RecordingTimer {
        fn start(&mut self) {
            self.0.borrow_mut().push("start");
        }
        fn stop(&mut self) {
            self.0.borrow_mut().push("stop");
        }
        fn reset(&mut self) {
            self.0.borrow_mut().push("reset");
        }
        fn elapsed_secs(&self) -> u64 {
            0
        }
    }

    fn fixed(mines: &[(usize, usize)]) -> GameEngine<NoTimer> {
        GameEngine::with_timer(GameConfig::new(5, 5, 1), NoTimer).with_mine_layout(mines)
    }

    #[test]
    fn neighbors_are_clamped_at_edges() {
        assert_eq!(neighbors(5, 5, 0, 0).count(), 3);
        assert_eq!(neighbors(5, 5, 0, 2).count(), 5);
        assert_eq!(neighbors(5, 5, 2, 2).count(), 8);
        assert_eq!(neighbors(5, 5, 4, 4).collect::<Vec<_>>(), vec![(3, 3), (3, 4), (4, 3)]);
    }

    #[test]
    fn results_merge_by_severity() {
        use RevealResult::*;
        assert_eq!(NoOp | NoOp, NoOp);
        assert_eq!(NoOp | RevealedSafe, RevealedSafe);
        assert_eq!(Won | RevealedSafe, Won);
        assert_eq!(Won | HitMine, HitMine);
    }

    #[test]
    fn timer_follows_the_session_lifecycle() {
        let mut engine =
            GameEngine::with_timer(GameConfig::new(5, 5, 1), RecordingTimer::default()).with_mine_layout(&[(0, 0)]);
        engine.timer().0.borrow_mut().clear();

        assert_eq!(engine.reveal(1, 1), RevealResult::RevealedSafe);
        assert_eq!(*engine.timer().0.borrow(), vec!["start"]);

        assert_eq!(engine.reveal(0, 0), RevealResult::HitMine);
        assert_eq!(*engine.timer().0.borrow(), vec!["start", "stop"]);

        engine.new_game(GameConfig::new(5, 5, 1));
        assert_eq!(*engine.timer().0.borrow(), vec!["start", "stop", "stop", "reset"]);
    }

    #[test]
    fn timer_stops_when_first_reveal_wins() {
        let mut engine = GameEngine::with_timer(GameConfig::new(5, 5, 1), RecordingTimer::default())
            .with_mine_layout(&[(0, 0), (4, 4)]);
        engine.timer().0.borrow_mut().clear();

        assert_eq!(engine.reveal(2, 2), RevealResult::Won);
        assert!(engine.is_finished());
        assert_eq!(*engine.timer().0.borrow(), vec!["start", "stop"]);
    }

    #[test]
    fn layout_without_mines_or_safe_cells_keeps_random_placement() {
        let all: Vec<_> = (0..5).flat_map(|r| (0..5).map(move |c| (r, c))).collect();
        for layout in [Vec::new(), vec![(9, 9), (0, 7)], all] {
            let mut engine = GameEngine::with_timer(GameConfig::new(5, 5, 3), NoTimer).seeded(11).with_mine_layout(&layout);
            assert!(!engine.mines_placed, "layout {:?}", layout);
            assert!(engine.config().is_valid());
            assert_eq!(engine.mine_count(), 3);
            assert!(engine.cells.iter().all(|c| !c.is_mine));

            assert_ne!(engine.reveal(2, 2), RevealResult::HitMine);
            assert_eq!(engine.cells.iter().filter(|c| c.is_mine).count(), 3);
            assert_eq!(engine.config().safe_cells(), 22);
        }
    }

    #[test]
    fn mines_are_not_placed_before_first_reveal() {
        let engine = GameEngine::with_timer(GameConfig::new(9, 9, 10), NoTimer).seeded(7);
        assert!(!engine.mines_placed);
        assert!(engine.cells.iter().all(|c| !c.is_mine));
    }

    #[test]
    fn dense_board_falls_back_to_single_safe_cell() {
        let mut engine = GameEngine::with_timer(GameConfig::new(5, 5, 20), NoTimer).seeded(3);
        assert_ne!(engine.reveal(2, 2), RevealResult::HitMine);
        assert_eq!(engine.cells.iter().filter(|c| c.is_mine).count(), 20);
        assert!(!engine.cell(2, 2).is_some_and(Cell::is_mine));
    }

    #[test]
    fn chord_needs_matching_flags() {
        let mut engine = fixed(&[(0, 0), (0, 2)]);
        assert_eq!(engine.reveal(1, 1), RevealResult::RevealedSafe);
        assert_eq!(engine.cell_view(1, 1), Some(CellView::Revealed(2)));

        engine.toggle_flag(0, 0);
        assert_eq!(engine.chord(1, 1), RevealResult::NoOp);
        assert!(!engine.cell(0, 1).is_some_and(Cell::revealed));

        engine.toggle_flag(0, 2);
        assert!(engine.chord(1, 1).changed());
        assert!(engine.cell(0, 1).is_some_and(Cell::revealed));
        assert!(engine.cell(2, 2).is_some_and(Cell::revealed));
    }

    #[test]
    fn chord_on_wrong_flag_loses() {
        let mut engine = fixed(&[(0, 0)]);
        engine.reveal(1, 1);
        engine.toggle_flag(0, 1);
        assert_eq!(engine.chord(1, 1), RevealResult::HitMine);
        assert_eq!(engine.state(), GameState::Lost);
        assert_eq!(engine.cell_view(0, 0), Some(CellView::TriggeredMine));
    }

    #[test]
    fn out_of_bounds_actions_are_ignored() {
        let mut engine = fixed(&[(0, 0)]);
        assert_eq!(engine.reveal(5, 0), RevealResult::NoOp);
        assert!(!engine.toggle_flag(0, 9));
        assert_eq!(engine.chord(9, 9), RevealResult::NoOp);
        assert_eq!(engine.cell_view(5, 5), None);
        assert_eq!(engine.state(), GameState::AwaitingFirstReveal);
    }

    #[test]
    fn cell_view_hides_unrevealed_mines() {
        let mut engine = fixed(&[(0, 0)]);
        assert_eq!(engine.cell_view(0, 0), Some(CellView::Hidden));
        engine.toggle_flag(0, 0);
        assert_eq!(engine.cell_view(0, 0), Some(CellView::Flagged));
        assert_eq!(engine.cell(0, 0).and_then(Cell::adjacent_mines), None);
    }
}
