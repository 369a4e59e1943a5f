//! Game configuration - board size, seed, and generation tuning

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{
    BOARD_COLUMNS, BOARD_ROWS, FILL_DENSITY_MAX, FILL_DENSITY_MIN, INITIAL_PIECES_MAX,
    INITIAL_PIECES_MIN, INITIAL_PIECE_ATTEMPTS, INITIAL_SPAWN_ROWS, INJECT_ATTEMPTS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: usize,
    pub columns: usize,
    pub seed: u32,
    /// Packer attempt budget per injected row
    pub inject_attempts: u32,
    /// Target fill fraction of an injected row is sampled from this range
    pub fill_density_min: f32,
    pub fill_density_max: f32,
    pub initial_pieces_min: u32,
    pub initial_pieces_max: u32,
    /// Bottom rows eligible for initial seeding
    pub initial_rows: usize,
    /// Placement attempts per seeded piece
    pub initial_attempts: u32,
}

impl GameConfig {
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_size(mut self, rows: usize, columns: usize) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows < 2 || self.columns == 0 {
            return Err(ConfigError::BoardTooSmall {
                rows: self.rows,
                columns: self.columns,
            });
        }
        let (min, max) = (self.fill_density_min, self.fill_density_max);
        if !(min > 0.0 && min <= max && max <= 1.0) {
            return Err(ConfigError::FillDensity { min, max });
        }
        if self.inject_attempts == 0 {
            return Err(ConfigError::ZeroAttempts {
                name: "inject_attempts",
            });
        }
        if self.initial_attempts == 0 {
            return Err(ConfigError::ZeroAttempts {
                name: "initial_attempts",
            });
        }
        if self.initial_pieces_min > self.initial_pieces_max {
            return Err(ConfigError::InitialPieces {
                min: self.initial_pieces_min,
                max: self.initial_pieces_max,
            });
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: BOARD_ROWS,
            columns: BOARD_COLUMNS,
            seed: 1,
            inject_attempts: INJECT_ATTEMPTS,
            fill_density_min: FILL_DENSITY_MIN,
            fill_density_max: FILL_DENSITY_MAX,
            initial_pieces_min: INITIAL_PIECES_MIN,
            initial_pieces_max: INITIAL_PIECES_MAX,
            initial_rows: INITIAL_SPAWN_ROWS,
            initial_attempts: INITIAL_PIECE_ATTEMPTS,
        }
    }
}
