//! Randomised checks of the engine invariants over seeds, board shapes and
//! click sequences.

use minefield::{Cell, GameConfig, GameEngine, GameState, NoTimer, RevealResult};
use proptest::prelude::*;

fn all_cells(e: &GameEngine<NoTimer>) -> Vec<(usize, usize)> {
    (0..e.height()).flat_map(|r| (0..e.width()).map(move |c| (r, c))).collect()
}

fn mine_at(e: &GameEngine<NoTimer>, (r, c): (usize, usize)) -> bool {
    e.cell(r, c).is_some_and(Cell::is_mine)
}

fn revealed_at(e: &GameEngine<NoTimer>, (r, c): (usize, usize)) -> bool {
    e.cell(r, c).is_some_and(Cell::revealed)
}

#[derive(Clone, Debug)]
enum Action {
    Reveal(usize, usize),
    Flag(usize, usize),
    Chord(usize, usize),
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (0..30usize, 0..50usize).prop_map(|(r, c)| Action::Reveal(r, c)),
        2 => (0..30usize, 0..50usize).prop_map(|(r, c)| Action::Flag(r, c)),
        1 => (0..30usize, 0..50usize).prop_map(|(r, c)| Action::Chord(r, c)),
    ]
}

proptest! {
    #[test]
    fn placement_respects_count_and_opening(
        seed in 1..u64::MAX,
        width in 5..=20usize,
        height in 5..=15usize,
        density in 1..=80usize,
        click in (0..15usize, 0..20usize),
    ) {
        let mines = (width * height * density / 100).max(1);
        let mut e = GameEngine::with_timer(GameConfig::new(width, height, mines), NoTimer).seeded(seed);
        let (row, col) = (click.0 % height, click.1 % width);

        prop_assert_ne!(e.reveal(row, col), RevealResult::HitMine);

        let placed = all_cells(&e).into_iter().filter(|&p| mine_at(&e, p)).count();
        prop_assert_eq!(placed, e.mine_count());

        let zone: Vec<_> = e.neighbors(row, col).collect();
        if e.mine_count() <= width * height - zone.len() - 1 {
            for p in zone {
                prop_assert!(!mine_at(&e, p));
            }
        }

        for (r, c) in all_cells(&e) {
            let cell = e.cell(r, c).unwrap();
            if !cell.is_mine() {
                let expected = e.neighbors(r, c).filter(|&p| mine_at(&e, p)).count() as u8;
                prop_assert_eq!(cell.adjacent_mines(), Some(expected));
            }
        }
    }

    #[test]
    fn invariants_hold_across_random_play(
        seed in 1..u64::MAX,
        width in 5..=12usize,
        height in 5..=12usize,
        mines in 1..40usize,
        actions in prop::collection::vec(action(), 1..60),
    ) {
        let mut e = GameEngine::with_timer(GameConfig::new(width, height, mines), NoTimer).seeded(seed);
        let mut was_revealed = vec![false; width * height];

        for a in actions {
            let before = e.state();
            let result = match a {
                Action::Reveal(r, c) => e.reveal(r, c),
                Action::Flag(r, c) => {
                    let was_revealed_cell = e.cell(r, c).is_some_and(Cell::revealed);
                    let changed = e.toggle_flag(r, c);
                    prop_assert!(!(changed && was_revealed_cell));
                    RevealResult::NoOp
                }
                Action::Chord(r, c) => e.chord(r, c),
            };

            if before.is_finished() {
                prop_assert_eq!(result, RevealResult::NoOp);
                prop_assert_eq!(e.state(), before);
            }
            prop_assert!(e.flag_count() <= e.mine_count());

            let cells = all_cells(&e);
            for (i, &p) in cells.iter().enumerate() {
                if was_revealed[i] {
                    prop_assert!(revealed_at(&e, p));
                }
                was_revealed[i] = revealed_at(&e, p);
                if e.state() != GameState::Lost {
                    prop_assert!(!(mine_at(&e, p) && revealed_at(&e, p)));
                }
            }

            let safe_open = cells.iter().filter(|&&p| revealed_at(&e, p) && !mine_at(&e, p)).count();
            prop_assert_eq!(safe_open, e.revealed_count());
            let all_open = safe_open == e.config().safe_cells();
            prop_assert_eq!(e.state() == GameState::Won, all_open && e.state() != GameState::Lost);

            if e.state() == GameState::Lost {
                for &p in &cells {
                    if mine_at(&e, p) {
                        prop_assert!(revealed_at(&e, p));
                    }
                }
            }
        }
    }

    #[test]
    fn zero_reveal_opens_exactly_the_region_and_border(seed in 1..u64::MAX, click in (0..9usize, 0..9usize)) {
        let mut e = GameEngine::with_timer(GameConfig::new(9, 9, 10), NoTimer).seeded(seed);
        e.reveal(click.0, click.1);

        // The first click is always a zero cell; rebuild its region independently.
        let w = e.width();
        let mut expected = vec![false; w * e.height()];
        let mut stack = vec![click];
        while let Some((r, c)) = stack.pop() {
            if expected[r * w + c] {
                continue;
            }
            expected[r * w + c] = true;
            if e.cell(r, c).and_then(Cell::adjacent_mines) == Some(0) {
                stack.extend(e.neighbors(r, c).filter(|&p| !mine_at(&e, p)));
            }
        }

        for p in all_cells(&e) {
            prop_assert_eq!(revealed_at(&e, p), expected[p.0 * w + p.1], "cell {:?}", p);
            prop_assert!(!(revealed_at(&e, p) && mine_at(&e, p)));
        }
    }
}
