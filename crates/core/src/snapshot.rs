use serde::{Deserialize, Serialize};

use crate::piece::Piece;
use crate::types::SettlePhase;

/// Read-only copy of the board for presentation and logging.
///
/// `grid[0]` is the bottom row. `pieces` is ordered bottom row first, then left
/// to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub rows: usize,
    pub columns: usize,
    pub grid: Vec<Vec<u8>>,
    pub pieces: Vec<Piece>,
    pub settling: bool,
    pub phase: SettlePhase,
    pub episode_id: u32,
    pub seed: u32,
}

impl BoardSnapshot {
    /// Moves are accepted only while the board is not settling
    pub fn playable(&self) -> bool {
        !self.settling
    }

    pub fn occupied_cells(&self) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|&&cell| cell != 0)
            .count()
    }
}
