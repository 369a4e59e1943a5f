//! Row injector - pushes the board up and packs a fresh bottom row
//!
//! The packer is a bounded random greedy: it samples a fill target, then draws
//! random widths and start columns and keeps whatever fits. It gives up after a
//! fixed number of attempts even if the target was not reached, so rows come out
//! with an uneven, slightly sparse texture; an under-filled row is a normal
//! result, not a failure.

use log::{debug, warn};

use crate::board::Board;
use crate::config::GameConfig;
use crate::lock::ProcessingLock;
use crate::rng::SimpleRng;
use crate::types::{BoardDelta, DeltaKind, PieceId, MAX_PIECE_WIDTH, MIN_PIECE_WIDTH};

#[derive(Debug, Clone)]
pub struct RowInjector {
    rng: SimpleRng,
    attempts: u32,
    fill_min: f32,
    fill_max: f32,
    initial_min: u32,
    initial_max: u32,
    initial_rows: usize,
    initial_attempts: u32,
}

impl RowInjector {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            rng: SimpleRng::new(config.seed),
            attempts: config.inject_attempts,
            fill_min: config.fill_density_min,
            fill_max: config.fill_density_max,
            initial_min: config.initial_pieces_min,
            initial_max: config.initial_pieces_max,
            initial_rows: config.initial_rows,
            initial_attempts: config.initial_attempts,
        }
    }

    /// Shift every row up and generate a new bottom row.
    ///
    /// Refused (None) unless the processing lock is held. An under-filled or even
    /// empty bottom row is still a successful injection.
    pub fn inject(&mut self, board: &mut Board, lock: &ProcessingLock) -> Option<BoardDelta> {
        if !lock.is_held() {
            warn!("row injection refused: processing lock not held");
            return None;
        }

        let shift = board.shift_rows_up_and_clear_bottom();
        let injected = self.fill_bottom_row(board);

        let mut delta = BoardDelta::new(DeltaKind::Inject);
        delta.shifted = shift.shifted;
        delta.removed = shift.removed;
        delta.injected = injected;
        Some(delta)
    }

    fn random_width(&mut self) -> usize {
        self.rng
            .next_between(MIN_PIECE_WIDTH as u32, MAX_PIECE_WIDTH as u32) as usize
    }

    /// Pack row 0, which must be empty
    fn fill_bottom_row(&mut self, board: &mut Board) -> Vec<PieceId> {
        let columns = board.columns();
        let density = self.rng.next_fraction(self.fill_min, self.fill_max);
        let target = (columns as f32 * density).floor() as usize;

        let mut placed = Vec::new();
        let mut filled = 0usize;
        let mut attempts = 0u32;

        while filled < target && attempts < self.attempts {
            attempts += 1;

            let mut width = self.random_width();
            let remaining = columns - filled;
            if width > remaining {
                width = self.rng.next_between(1, remaining as u32) as usize;
            }

            let start = self.rng.next_range((columns - width + 1) as u32) as usize;
            if let Some(id) = board.spawn_piece(0, start, width as u8) {
                placed.push(id);
                filled += width;
            }
        }

        debug!(
            "bottom row packed: {} piece(s), {}/{} cells (target {}) in {} attempt(s)",
            placed.len(),
            filled,
            columns,
            target,
            attempts
        );
        placed
    }

    /// Seed a new game: a few random pieces in the bottom rows.
    ///
    /// Stops early when a piece cannot be placed within its attempt budget;
    /// placing nothing at all is a normal outcome.
    pub fn seed_initial_pieces(&mut self, board: &mut Board) -> Vec<PieceId> {
        let count = self.rng.next_between(self.initial_min, self.initial_max);
        let rows = self.initial_rows.min(board.rows());

        let mut placed = Vec::new();
        if rows == 0 {
            return placed;
        }

        for n in 0..count {
            match self.spawn_random_piece(board, rows) {
                Some(id) => placed.push(id),
                None => {
                    debug!("initial seeding stopped after {} of {} piece(s)", n, count);
                    break;
                }
            }
        }
        placed
    }

    fn spawn_random_piece(&mut self, board: &mut Board, rows: usize) -> Option<PieceId> {
        let columns = board.columns();
        let width = self.random_width().min(columns);

        for _ in 0..self.initial_attempts {
            let row = self.rng.next_range(rows as u32) as usize;
            let col = self.rng.next_range((columns - width + 1) as u32) as usize;
            if let Some(id) = board.spawn_piece(row, col, width as u8) {
                return Some(id);
            }
        }
        None
    }
}
