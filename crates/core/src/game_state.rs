//! Game state module - the session facade over board, injector and settle loop
//!
//! Every request that mutates the board goes through [`GameState`], and every
//! board mutation comes back out as a [`BoardDelta`] value for collaborators to
//! animate or log. Moves are rejected while a settle run holds the processing
//! lock; settle requests made during a run are dropped.

use std::ops::RangeInclusive;

use log::{debug, info};

use crate::board::Board;
use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::injector::RowInjector;
use crate::lock::ProcessingLock;
use crate::piece::Piece;
use crate::settle::SettleLoop;
use crate::snapshot::BoardSnapshot;
use crate::types::{BoardDelta, CellState, DeltaKind, PieceId, SettlePhase};

#[derive(Debug)]
pub struct GameState {
    config: GameConfig,
    board: Board,
    injector: RowInjector,
    settle: SettleLoop,
    lock: ProcessingLock,
    started: bool,
    /// Monotonic episode id (increments on reset).
    episode_id: u32,
}

impl GameState {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    /// Default-sized game with the given seed
    pub fn with_seed(seed: u32) -> Self {
        Self::from_valid(GameConfig::default().with_seed(seed))
    }

    /// Wrap a prepared board. Its dimensions override the config's.
    ///
    /// The game counts as started, so [`GameState::start`] will not seed it.
    pub fn from_board(config: GameConfig, board: Board) -> Result<Self, ConfigError> {
        let config = config.with_size(board.rows(), board.columns());
        config.validate()?;
        let mut state = Self::from_valid(config);
        state.board = board;
        state.started = true;
        Ok(state)
    }

    fn from_valid(config: GameConfig) -> Self {
        Self {
            board: Board::new(config.rows, config.columns),
            injector: RowInjector::new(&config),
            settle: SettleLoop::new(),
            lock: ProcessingLock::new(),
            started: false,
            episode_id: 0,
            config,
        }
    }

    /// Seed the opening pieces and let them settle (no injection).
    ///
    /// Returns the spawn delta followed by the drain's deltas. Does nothing on a
    /// game that has already started.
    pub fn start(&mut self) -> Vec<BoardDelta> {
        let Some(mut deltas) = self.begin_start() else {
            return Vec::new();
        };
        deltas.extend(
            self.settle
                .run(&mut self.board, &mut self.injector, &self.lock),
        );
        deltas
    }

    /// Seed the opening pieces and open a drain-only run without driving it.
    ///
    /// Returns the spawn delta (if anything was placed) with the lock already
    /// held; step the drain with [`GameState::advance_settle`]. None if the game
    /// has already started or the board is settling.
    pub fn begin_start(&mut self) -> Option<Vec<BoardDelta>> {
        if self.started || self.is_settling() {
            return None;
        }
        if !self.settle.begin_drain(&self.lock) {
            return None;
        }
        self.started = true;

        let mut deltas = Vec::new();
        let placed = self.injector.seed_initial_pieces(&mut self.board);
        info!(
            "episode {} started with {} piece(s) (seed {})",
            self.episode_id,
            placed.len(),
            self.config.seed
        );
        if !placed.is_empty() {
            let mut spawn = BoardDelta::new(DeltaKind::Spawn);
            spawn.injected = placed;
            deltas.push(spawn);
        }
        Some(deltas)
    }

    /// Empty the board for a new episode. Refused while settling.
    ///
    /// The RNG keeps its state, so the next episode differs from the last.
    pub fn reset(&mut self) -> bool {
        if self.is_settling() {
            debug!("reset rejected: board is settling");
            return false;
        }
        self.board.clear();
        self.started = false;
        self.episode_id = self.episode_id.wrapping_add(1);
        true
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Slide a piece toward `target_col` within its row.
    ///
    /// The target is clamped to the piece's legal columns. None if the board is
    /// settling, the piece does not exist, or nothing moved.
    pub fn move_request(&mut self, id: PieceId, target_col: i32) -> Option<BoardDelta> {
        if self.is_settling() {
            debug!("move of {} rejected: board is settling", id);
            return None;
        }
        let slide = self.board.move_piece(id, target_col)?;
        debug!(
            "moved {} on row {} from column {} to {}",
            id, slide.row, slide.from_col, slide.to_col
        );

        let mut delta = BoardDelta::new(DeltaKind::Slide);
        delta.slid = Some(slide);
        Some(delta)
    }

    /// Run a full settle to quiescence.
    ///
    /// None if a run is already active; the request is dropped, not queued.
    pub fn settle_request(&mut self) -> Option<Vec<BoardDelta>> {
        if !self.begin_settle() {
            return None;
        }
        Some(
            self.settle
                .run(&mut self.board, &mut self.injector, &self.lock),
        )
    }

    /// One player turn: move, then settle only if the piece actually moved
    pub fn play(&mut self, id: PieceId, target_col: i32) -> Option<Vec<BoardDelta>> {
        let slide = self.move_request(id, target_col)?;
        let mut deltas = vec![slide];
        if let Some(settled) = self.settle_request() {
            deltas.extend(settled);
        }
        Some(deltas)
    }

    /// Start a settle run without driving it; step it with [`GameState::advance_settle`]
    pub fn begin_settle(&mut self) -> bool {
        self.settle.begin(&self.lock)
    }

    /// Apply the next settle mutation. None once the run has finished.
    pub fn advance_settle(&mut self) -> Option<BoardDelta> {
        self.settle
            .next_delta(&mut self.board, &mut self.injector, &self.lock)
    }

    pub fn is_settling(&self) -> bool {
        self.lock.is_held()
    }

    pub fn settle_phase(&self) -> SettlePhase {
        self.settle.phase()
    }

    /// Observation handle on the processing lock, for presentation tasks
    pub fn settle_lock(&self) -> ProcessingLock {
        self.lock.clone()
    }

    pub fn all_pieces(&self) -> &[Piece] {
        self.board.pieces()
    }

    pub fn pieces_in_row(&self, row: usize) -> Vec<Piece> {
        self.board.pieces_in_row(row)
    }

    /// Cell at (row, col), None if out of bounds
    pub fn cell(&self, row: i32, col: i32) -> Option<CellState> {
        self.board.get(row, col)
    }

    pub fn movable_range(&self, id: PieceId) -> Option<(usize, usize)> {
        self.board.movable_range(id)
    }

    pub fn target_cols(&self, id: PieceId) -> Option<RangeInclusive<usize>> {
        self.board.target_cols(id)
    }

    /// Pieces with at least one legal column other than their current one
    pub fn movable_pieces(&self) -> Vec<PieceId> {
        self.board
            .pieces()
            .iter()
            .filter(|p| {
                self.board
                    .target_cols(p.id)
                    .is_some_and(|range| range.start() != range.end())
            })
            .map(|p| p.id)
            .collect()
    }

    pub fn snapshot_into(&self, out: &mut BoardSnapshot) {
        out.rows = self.board.rows();
        out.columns = self.board.columns();
        self.board.write_u8_grid(&mut out.grid);
        out.pieces.clear();
        out.pieces.extend_from_slice(self.board.pieces());
        out.pieces.sort_by_key(|p| (p.row, p.col));
        out.settling = self.is_settling();
        out.phase = self.settle.phase();
        out.episode_id = self.episode_id;
        out.seed = self.config.seed;
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut s = BoardSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::from_valid(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(placements: &[(usize, usize, u8)]) -> GameState {
        let board = Board::from_pieces(8, 10, placements).unwrap();
        GameState::from_board(GameConfig::default(), board).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = GameConfig::default().with_size(0, 10);
        assert!(GameState::new(config).is_err());
    }

    #[test]
    fn test_start_seeds_and_settles_without_injecting() {
        let mut state = GameState::with_seed(12345);
        let deltas = state.start();

        assert!(state.started());
        assert!(!state.is_settling());
        assert!(deltas.iter().all(|d| d.kind != DeltaKind::Inject));
        if let Some(first) = deltas.first() {
            assert_eq!(first.kind, DeltaKind::Spawn);
        }
        assert!(state.board().check_invariants().is_ok());
        assert!(state.board().preview_drops().is_empty());
        assert!(state.start().is_empty(), "second start is a no-op");
    }

    #[test]
    fn test_begin_start_holds_lock_until_drain_finishes() {
        let mut state = GameState::with_seed(1);
        let spawned = state.begin_start().unwrap();

        assert!(state.started());
        assert!(state.is_settling());
        assert!(spawned.iter().all(|d| d.kind == DeltaKind::Spawn));
        assert!(state.begin_start().is_none());
        assert!(state.settle_request().is_none());
        if let Some(id) = state.all_pieces().first().map(|p| p.id) {
            assert!(state.move_request(id, 0).is_none());
            assert!(state.move_request(id, 9).is_none());
        }

        while let Some(delta) = state.advance_settle() {
            assert_ne!(delta.kind, DeltaKind::Inject);
            assert!(state.is_settling());
        }
        assert!(!state.is_settling());
        assert!(state.board().preview_drops().is_empty());
    }

    #[test]
    fn test_reset_increments_episode_id() {
        let mut state = GameState::with_seed(3);
        state.start();
        assert_eq!(state.episode_id(), 0);
        assert!(state.reset());
        assert_eq!(state.episode_id(), 1);
        assert_eq!(state.all_pieces().len(), 0);
        assert!(!state.started());
    }

    #[test]
    fn test_move_rejected_while_settling() {
        let mut state = state_with(&[(0, 0, 2), (3, 5, 1)]);
        let id = state.all_pieces()[0].id;

        assert!(state.begin_settle());
        assert!(state.is_settling());
        assert!(state.move_request(id, 6).is_none());
        assert!(!state.reset());

        while state.advance_settle().is_some() {}
        assert!(!state.is_settling());
    }

    #[test]
    fn test_move_request_clamps_and_reports_slide() {
        let mut state = state_with(&[(0, 0, 2), (0, 6, 1)]);
        let id = state.all_pieces()[0].id;

        let delta = state.move_request(id, 20).unwrap();
        let slide = delta.slid.unwrap();
        assert_eq!(delta.kind, DeltaKind::Slide);
        assert_eq!((slide.from_col, slide.to_col), (0, 4));
        assert!(state.move_request(id, 4).is_none(), "already there");
    }

    #[test]
    fn test_play_without_movement_does_not_settle() {
        // Row 0 is full but nothing can slide, so the clear never runs.
        let mut state = state_with(&[(0, 0, 4), (0, 4, 4), (0, 8, 2)]);
        let id = state.all_pieces()[0].id;
        assert!(state.play(id, 3).is_none());
        assert_eq!(state.all_pieces().len(), 3);
    }

    #[test]
    fn test_snapshot_reflects_board() {
        let state = state_with(&[(1, 4, 3), (0, 0, 1)]);
        let snap = state.snapshot();
        assert_eq!((snap.rows, snap.columns), (8, 10));
        assert_eq!(snap.grid[0][0], 1);
        assert_eq!(snap.grid[1][4..7].to_vec(), vec![1, 1, 1]);
        assert_eq!(snap.occupied_cells(), 4);
        assert_eq!(snap.pieces[0].row, 0, "bottom row first");
        assert!(snap.playable());
    }

    #[test]
    fn test_movable_pieces_skips_boxed_in() {
        let state = state_with(&[(0, 0, 4), (0, 4, 4), (0, 8, 1), (1, 0, 1)]);
        let movable = state.movable_pieces();
        // Only the piece at (0,8) (one free cell at column 9) and the single
        // on row 1 can move.
        assert_eq!(movable.len(), 2);
    }
}
