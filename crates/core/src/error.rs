//! Error types for board consistency checks and configuration

use thiserror::Error;

use crate::types::PieceId;

/// A broken board invariant.
///
/// These indicate a bug in whoever mutated the board, never a condition a
/// caller is expected to recover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("piece {piece} has invalid width {width}")]
    BadWidth { piece: PieceId, width: u8 },

    #[error("piece {piece} at row {row}, columns {col}..{right} lies outside the board")]
    OutOfBounds {
        piece: PieceId,
        row: usize,
        col: usize,
        right: usize,
    },

    #[error("pieces {first} and {second} both cover cell ({row}, {col})")]
    Overlap {
        first: PieceId,
        second: PieceId,
        row: usize,
        col: usize,
    },

    #[error("grid cell ({row}, {col}) is {found} but the piece set says {expected}")]
    GridDrift {
        row: usize,
        col: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("piece id {piece} appears more than once")]
    DuplicateId { piece: PieceId },
}

/// Rejected [`GameConfig`](crate::config::GameConfig) values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("board needs at least 2 rows and 1 column, got {rows}x{columns}")]
    BoardTooSmall { rows: usize, columns: usize },

    #[error("fill density range {min}..{max} must satisfy 0 < min <= max <= 1")]
    FillDensity { min: f32, max: f32 },

    #[error("{name} must be at least 1")]
    ZeroAttempts { name: &'static str },

    #[error("initial piece range {min}..={max} is inverted")]
    InitialPieces { min: u32, max: u32 },
}
