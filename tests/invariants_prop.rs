//! Property tests over random play-outs.
//!
//! Whatever sequence of moves and settles a seed produces, the board must keep
//! pieces in bounds and non-overlapping, the grid must equal the union of the
//! piece footprints, and every settle run must end quiet and unlocked.

use proptest::prelude::*;
use tetra_slide::core::{Board, GameConfig, GameState, SimpleRng};
use tetra_slide::types::DeltaKind;

fn assert_quiet(state: &GameState) {
    assert!(!state.is_settling());
    assert!(state.board().preview_drops().is_empty(), "a piece can still fall");
    assert!(state.board().full_rows().is_empty(), "a full row survived");
}

/// Random placements, keeping only those that fit
fn scattered_board(seed: u32, rows: usize, columns: usize, count: usize) -> Board {
    let mut rng = SimpleRng::new(seed);
    let mut board = Board::new(rows, columns);
    for _ in 0..count {
        let width = rng.next_between(1, 4).min(columns as u32) as u8;
        let row = rng.next_range(rows as u32) as usize;
        let col = rng.next_range((columns - width as usize + 1) as u32) as usize;
        board.spawn_piece(row, col, width);
    }
    board
}

#[test]
fn drop_then_clear_twice_is_a_fixed_point_after_settle() {
    let board = scattered_board(2024, 8, 10, 25);
    let mut state = GameState::from_board(GameConfig::default(), board).unwrap();
    state.settle_request().unwrap();
    assert_quiet(&state);

    let mut board = state.board().clone();
    assert!(board.resolve_drops().is_empty());
    assert!(board.resolve_clears().is_empty());
}

proptest! {
    #[test]
    fn random_boards_settle_to_a_consistent_quiet_state(
        seed in 1u32..u32::MAX,
        rows in 2usize..12,
        columns in 2usize..14,
        count in 0usize..40,
    ) {
        let board = scattered_board(seed, rows, columns, count);
        prop_assert!(board.check_invariants().is_ok());

        let mut state = GameState::from_board(GameConfig::default().with_seed(seed), board).unwrap();
        let deltas = state.settle_request().unwrap();

        prop_assert!(state.board().check_invariants().is_ok());
        prop_assert_eq!(deltas.iter().filter(|d| d.kind == DeltaKind::Inject).count(), 1);
        prop_assert!(deltas.iter().all(|d| !d.is_empty()));
        assert_quiet(&state);
    }

    #[test]
    fn generated_playout_respects_board_invariants(
        seed in any::<u32>(),
        turns in 1usize..60,
    ) {
        let mut state = GameState::with_seed(seed);
        state.start();
        assert_quiet(&state);
        let mut picker = SimpleRng::new(seed.wrapping_mul(31).wrapping_add(7));

        for _ in 0..turns {
            let movable = state.movable_pieces();
            if movable.is_empty() {
                prop_assert!(state.reset());
                state.start();
                continue;
            }

            let id = movable[picker.next_range(movable.len() as u32) as usize];
            let width = state.board().piece(id).unwrap().width as usize;
            let (min, max) = state.movable_range(id).unwrap();
            // -3..=12 reaches past both edges
            let target = picker.next_range(16) as i32 - 3;

            if let Some(deltas) = state.play(id, target) {
                let slide = deltas[0].slid.unwrap();
                prop_assert!(slide.to_col >= min);
                prop_assert!(slide.to_col + width - 1 <= max);
            }

            prop_assert!(state.board().check_invariants().is_ok());
            assert_quiet(&state);
        }
    }
}
