//! Paced settle driver.
//!
//! Bridges the synchronous core with an async presenter: every delta is applied
//! to the board first, then handed to the presenter as a [`Frame`], and the
//! driver waits for that frame to be completed before applying the next one.

use log::{debug, trace, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::Pacing;
use crate::core::GameState;
use crate::delta_log::DeltaLog;
use crate::types::{BoardDelta, PieceId};

/// One applied delta awaiting its animation.
///
/// Dropping a frame without calling [`Frame::complete`] also releases the driver.
#[derive(Debug)]
pub struct Frame {
    pub delta: BoardDelta,
    done: oneshot::Sender<()>,
}

impl Frame {
    pub fn complete(self) {
        let _ = self.done.send(());
    }
}

/// Forwards deltas to a presenter and waits for each animation to finish
#[derive(Debug)]
pub struct PacedDriver {
    frames: Option<mpsc::Sender<Frame>>,
    log: Option<DeltaLog>,
    presented: u64,
}

impl PacedDriver {
    pub fn new(frames: mpsc::Sender<Frame>, log: Option<DeltaLog>) -> Self {
        Self {
            frames: Some(frames),
            log,
            presented: 0,
        }
    }

    /// Driver with no presenter; deltas are only logged
    pub fn headless(log: Option<DeltaLog>) -> Self {
        Self {
            frames: None,
            log,
            presented: 0,
        }
    }

    /// Deltas forwarded so far
    pub fn presented(&self) -> u64 {
        self.presented
    }

    async fn present(&mut self, delta: BoardDelta) {
        self.presented += 1;
        if let Some(log) = &self.log {
            log.record(&delta);
        }

        let Some(frames) = &self.frames else {
            return;
        };
        let (done, finished) = oneshot::channel();
        let kind = delta.kind;
        if frames.send(Frame { delta, done }).await.is_err() {
            // No cancellation: keep settling without animation.
            warn!("presenter went away; continuing without animation");
            self.frames = None;
            return;
        }
        let _ = finished.await;
        trace!("{} frame completed", kind.as_str());
    }

    /// Seed and drain a new game, presenting every delta.
    ///
    /// The board stays locked from the spawn frame until the drain is over.
    pub async fn start(&mut self, game: &mut GameState) -> usize {
        let Some(spawned) = game.begin_start() else {
            debug!("paced start ignored: game already started");
            return 0;
        };
        let mut count = 0;
        for delta in spawned {
            self.present(delta).await;
            count += 1;
        }
        while let Some(delta) = game.advance_settle() {
            self.present(delta).await;
            count += 1;
        }
        count
    }

    /// Run one settle to quiescence, one presented delta at a time.
    ///
    /// Returns None if a run was already active.
    pub async fn settle(&mut self, game: &mut GameState) -> Option<usize> {
        if !game.begin_settle() {
            debug!("paced settle request dropped: already settling");
            return None;
        }
        let mut count = 0;
        while let Some(delta) = game.advance_settle() {
            self.present(delta).await;
            count += 1;
        }
        Some(count)
    }

    /// Move a piece and, if it moved, settle the board.
    ///
    /// Returns the number of deltas presented, or None if the move was rejected.
    pub async fn play_turn(
        &mut self,
        game: &mut GameState,
        id: PieceId,
        target_col: i32,
    ) -> Option<usize> {
        let slide = game.move_request(id, target_col)?;
        self.present(slide).await;
        let settled = self.settle(game).await.unwrap_or(0);
        Some(settled + 1)
    }
}

/// Presenter that "animates" by sleeping for each delta's pause.
///
/// Resolves to the number of frames shown once the driver side is dropped.
pub fn spawn_timed_presenter(mut frames: mpsc::Receiver<Frame>, pacing: Pacing) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut shown = 0u64;
        while let Some(frame) = frames.recv().await {
            let delay = pacing.delay_for(frame.delta.kind);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            shown += 1;
            frame.complete();
        }
        shown
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Board, GameConfig};
    use crate::types::DeltaKind;

    /// Bottom row one cell short, with a single hovering over the hole
    fn about_to_clear() -> GameState {
        let board =
            Board::from_pieces(8, 10, &[(0, 0, 4), (0, 4, 4), (0, 8, 1), (3, 9, 1)]).unwrap();
        GameState::from_board(GameConfig::default(), board).unwrap()
    }

    #[tokio::test]
    async fn test_start_presents_opening_frames_while_locked() {
        for seed in 1..20 {
            let mut game = GameState::with_seed(seed);
            let observer = game.settle_lock();
            let (tx, mut rx) = mpsc::channel::<Frame>(1);

            let presenter = tokio::spawn(async move {
                let mut unlocked = Vec::new();
                let mut shown = 0;
                while let Some(frame) = rx.recv().await {
                    if !observer.is_held() {
                        unlocked.push(frame.delta.kind);
                    }
                    shown += 1;
                    frame.complete();
                }
                (shown, unlocked)
            });

            let mut driver = PacedDriver::new(tx, None);
            let count = driver.start(&mut game).await;
            assert_eq!(driver.start(&mut game).await, 0, "second start is a no-op");
            drop(driver);

            let (shown, unlocked) = presenter.await.unwrap();
            assert_eq!(shown, count);
            assert!(unlocked.is_empty(), "seed {} unlocked frames: {:?}", seed, unlocked);
            assert!(game.started());
            assert!(!game.is_settling());
            assert!(game.board().preview_drops().is_empty());
        }
    }

    #[tokio::test]
    async fn test_settle_presents_each_delta_while_locked() {
        let mut game = about_to_clear();
        let observer = game.settle_lock();
        let (tx, mut rx) = mpsc::channel::<Frame>(1);

        let presenter = tokio::spawn(async move {
            let mut kinds = Vec::new();
            while let Some(frame) = rx.recv().await {
                assert!(observer.is_held(), "board must stay locked during animation");
                kinds.push(frame.delta.kind);
                frame.complete();
            }
            kinds
        });

        let mut driver = PacedDriver::new(tx, None);
        let count = driver.settle(&mut game).await.unwrap();
        drop(driver);

        let kinds = presenter.await.unwrap();
        assert_eq!(kinds.len(), count);
        assert_eq!(&kinds[..2], &[DeltaKind::Drop, DeltaKind::Clear]);
        assert_eq!(kinds.iter().filter(|k| **k == DeltaKind::Inject).count(), 1);
        assert!(!game.is_settling());
    }

    #[tokio::test]
    async fn test_dropped_frames_do_not_stall_the_driver() {
        let mut game = about_to_clear();
        let (tx, mut rx) = mpsc::channel::<Frame>(4);
        let presenter = tokio::spawn(async move {
            let mut n = 0;
            while let Some(frame) = rx.recv().await {
                drop(frame);
                n += 1;
            }
            n
        });

        let mut driver = PacedDriver::new(tx, None);
        let count = driver.settle(&mut game).await.unwrap();
        drop(driver);
        assert_eq!(presenter.await.unwrap(), count);
    }

    #[tokio::test]
    async fn test_vanished_presenter_still_settles_to_quiescence() {
        let mut game = about_to_clear();
        let (tx, rx) = mpsc::channel::<Frame>(1);
        drop(rx);

        let mut driver = PacedDriver::new(tx, None);
        let count = driver.settle(&mut game).await.unwrap();
        assert!(count >= 3);
        assert_eq!(driver.presented(), count as u64);
        assert!(!game.is_settling());
        assert!(game.board().preview_drops().is_empty());
    }

    #[tokio::test]
    async fn test_play_turn_rejects_unknown_piece() {
        let mut game = about_to_clear();
        let mut driver = PacedDriver::headless(None);
        assert!(driver.play_turn(&mut game, PieceId(999), 0).await.is_none());
        assert_eq!(driver.presented(), 0);
    }

    #[test]
    fn test_timed_presenter_counts_frames() {
        tokio_test::block_on(async {
            let mut game = about_to_clear();
            let (tx, rx) = mpsc::channel::<Frame>(1);
            let presenter = spawn_timed_presenter(rx, Pacing::instant());

            let mut driver = PacedDriver::new(tx, None);
            let single = game.pieces_in_row(3)[0].id;
            let count = driver.play_turn(&mut game, single, 2).await.unwrap();
            drop(driver);

            assert_eq!(presenter.await.unwrap(), count as u64);
        });
    }
}
