//! Settle loop - drives the board from a player move back to a stable state
//!
//! ```text
//! Idle -> Dropping -> Clearing --(anything changed)--> Dropping
//!                        |
//!                        +--(quiet, not yet injected)--> Injecting -> Dropping
//!                        |
//!                        +--(quiet, injected)----------> Idle
//! ```
//!
//! A drop/clear pass is repeated until one pass produces neither a drop nor a
//! clear; a clear can open a gap and a drop can complete a row, so one quiet
//! half is not enough. After the first quiet pass one row is injected, and the
//! drain runs again because the new row can start its own chain.
//!
//! The loop owns the processing guard for the whole run. It is released when the
//! machine returns to `Idle`, and also if a step panics (the guard is held on the
//! stack while the board is being mutated).

use log::{debug, trace, warn};

use crate::board::Board;
use crate::injector::RowInjector;
use crate::lock::{ProcessingGuard, ProcessingLock};
use crate::types::{BoardDelta, DeltaKind, SettlePhase};

#[derive(Debug, Default)]
pub struct SettleLoop {
    phase: SettlePhase,
    guard: Option<ProcessingGuard>,
    /// Whether the current pass dropped anything
    pass_changed: bool,
    inject_pending: bool,
    passes: u32,
}

impl SettleLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SettlePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_some()
    }

    /// Drop/clear passes completed in the current (or last) run
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Start a full run (drain, inject, drain).
    ///
    /// Returns false, changing nothing, if a run is already active or the lock
    /// is held elsewhere. Requests are dropped, never queued.
    pub fn begin(&mut self, lock: &ProcessingLock) -> bool {
        self.start(lock, true)
    }

    /// Start a drain-only run (no row injection), used after initial seeding
    pub fn begin_drain(&mut self, lock: &ProcessingLock) -> bool {
        self.start(lock, false)
    }

    fn start(&mut self, lock: &ProcessingLock, inject: bool) -> bool {
        if self.guard.is_some() {
            debug!("settle request dropped: a run is already active");
            return false;
        }
        let Some(guard) = lock.try_acquire() else {
            debug!("settle request dropped: processing lock is held");
            return false;
        };

        self.guard = Some(guard);
        self.phase = SettlePhase::Dropping;
        self.pass_changed = false;
        self.inject_pending = inject;
        self.passes = 0;
        debug!("settle loop started (inject: {})", inject);
        true
    }

    /// Advance to the next board mutation that changed something and return its
    /// delta. Returns None once the machine is back in `Idle`; the lock has been
    /// released by then.
    pub fn next_delta(
        &mut self,
        board: &mut Board,
        injector: &mut RowInjector,
        lock: &ProcessingLock,
    ) -> Option<BoardDelta> {
        let guard = self.guard.take()?;

        loop {
            match self.phase {
                SettlePhase::Idle => {
                    debug!("settle loop finished after {} pass(es)", self.passes);
                    drop(guard);
                    return None;
                }
                SettlePhase::Dropping => {
                    let moves = board.resolve_drops();
                    self.pass_changed = !moves.is_empty();
                    self.phase = SettlePhase::Clearing;

                    if !moves.is_empty() {
                        let mut delta = BoardDelta::new(DeltaKind::Drop);
                        delta.moved = moves;
                        trace!("board after drop:\n{}", board);
                        self.guard = Some(guard);
                        return Some(delta);
                    }
                }
                SettlePhase::Clearing => {
                    let cleared = board.resolve_clears();
                    let changed = self.pass_changed || !cleared.is_empty();
                    self.passes += 1;

                    self.phase = if changed {
                        SettlePhase::Dropping
                    } else if self.inject_pending {
                        SettlePhase::Injecting
                    } else {
                        SettlePhase::Idle
                    };
                    trace!("pass {} done, next phase {}", self.passes, self.phase.as_str());

                    if !cleared.is_empty() {
                        let mut delta = BoardDelta::new(DeltaKind::Clear);
                        delta.cleared_rows = cleared.rows;
                        delta.removed = cleared.removed;
                        trace!("board after clear:\n{}", board);
                        self.guard = Some(guard);
                        return Some(delta);
                    }
                }
                SettlePhase::Injecting => {
                    self.inject_pending = false;
                    match injector.inject(board, lock) {
                        Some(delta) => {
                            self.phase = SettlePhase::Dropping;
                            if !delta.is_empty() {
                                trace!("board after inject:\n{}", board);
                                self.guard = Some(guard);
                                return Some(delta);
                            }
                        }
                        None => {
                            warn!("injection rejected; ending settle run");
                            self.phase = SettlePhase::Idle;
                        }
                    }
                }
            }
        }
    }

    /// Drive the machine to `Idle`, collecting every delta in order
    pub fn run(
        &mut self,
        board: &mut Board,
        injector: &mut RowInjector,
        lock: &ProcessingLock,
    ) -> Vec<BoardDelta> {
        let mut deltas = Vec::new();
        while let Some(delta) = self.next_delta(board, injector, lock) {
            deltas.push(delta);
        }
        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn kinds(deltas: &[BoardDelta]) -> Vec<DeltaKind> {
        deltas.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_second_begin_is_dropped_while_running() {
        let lock = ProcessingLock::new();
        let mut settle = SettleLoop::new();
        assert!(settle.begin(&lock));
        assert!(!settle.begin(&lock));
        assert!(settle.is_running());
        assert!(lock.is_held());
    }

    #[test]
    fn test_begin_fails_when_lock_is_held_elsewhere() {
        let lock = ProcessingLock::new();
        let _other = lock.try_acquire().unwrap();
        let mut settle = SettleLoop::new();
        assert!(!settle.begin(&lock));
        assert_eq!(settle.phase(), SettlePhase::Idle);
    }

    #[test]
    fn test_drain_cascades_drop_clear_drop() {
        // Row 0 has a one-cell hole at column 3; the single above fills it,
        // the row clears, and the pair on row 2 then falls to the bottom.
        let mut board = Board::from_pieces(4, 4, &[(0, 0, 3), (1, 3, 1), (2, 0, 2)]).unwrap();
        let mut injector = RowInjector::new(&GameConfig::default());
        let lock = ProcessingLock::new();
        let mut settle = SettleLoop::new();

        assert!(settle.begin_drain(&lock));
        let deltas = settle.run(&mut board, &mut injector, &lock);

        assert_eq!(
            kinds(&deltas),
            vec![DeltaKind::Drop, DeltaKind::Clear, DeltaKind::Drop]
        );
        assert_eq!(deltas[1].cleared_rows, vec![0]);
        assert_eq!(deltas[1].removed.len(), 2);
        assert_eq!(board.piece_count(), 1);
        assert_eq!(board.pieces()[0].row, 0);
        assert_eq!(settle.passes(), 3);
        assert!(!lock.is_held());
        assert_eq!(settle.phase(), SettlePhase::Idle);
    }

    #[test]
    fn test_full_run_injects_exactly_once() {
        let mut board = Board::from_pieces(8, 10, &[(0, 0, 2)]).unwrap();
        let mut injector = RowInjector::new(&GameConfig::default().with_seed(9));
        let lock = ProcessingLock::new();
        let mut settle = SettleLoop::new();

        assert!(settle.begin(&lock));
        let deltas = settle.run(&mut board, &mut injector, &lock);

        let injects = deltas.iter().filter(|d| d.kind == DeltaKind::Inject).count();
        assert_eq!(injects, 1);
        assert_eq!(deltas[0].kind, DeltaKind::Inject, "board was already stable");
        assert!(!lock.is_held());
        assert!(board.check_invariants().is_ok());
    }

    #[test]
    #[cfg(debug_assertions)]
    fn test_panicking_step_releases_the_lock() {
        use std::panic::{catch_unwind, AssertUnwindSafe};
        use crate::types::CellState;

        // A raw write the piece set knows nothing about; the drop pass's
        // consistency check panics on it.
        let mut board = Board::from_pieces(8, 10, &[(3, 0, 2)]).unwrap();
        board.set_cell(7, 9, CellState::Occupied);
        let mut injector = RowInjector::new(&GameConfig::default());
        let lock = ProcessingLock::new();
        let mut settle = SettleLoop::new();

        assert!(settle.begin(&lock));
        let result = catch_unwind(AssertUnwindSafe(|| {
            settle.run(&mut board, &mut injector, &lock)
        }));

        assert!(result.is_err());
        assert!(!lock.is_held());
        assert!(!settle.is_running());
        assert!(settle.begin(&lock), "a new run can start after the failure");
    }

    #[test]
    fn test_next_delta_without_begin_is_none() {
        let mut board = Board::default();
        let mut injector = RowInjector::new(&GameConfig::default());
        let lock = ProcessingLock::new();
        let mut settle = SettleLoop::new();
        assert!(settle.next_delta(&mut board, &mut injector, &lock).is_none());
    }

    #[test]
    fn test_lock_stays_held_between_paced_steps() {
        let mut board = Board::from_pieces(8, 10, &[(3, 0, 4)]).unwrap();
        let mut injector = RowInjector::new(&GameConfig::default());
        let lock = ProcessingLock::new();
        let mut settle = SettleLoop::new();

        assert!(settle.begin(&lock));
        let first = settle.next_delta(&mut board, &mut injector, &lock).unwrap();
        assert_eq!(first.kind, DeltaKind::Drop);
        assert!(lock.is_held());
        assert!(settle.is_running());

        while settle.next_delta(&mut board, &mut injector, &lock).is_some() {}
        assert!(!lock.is_held());
    }
}
