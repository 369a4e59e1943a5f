//! Piece module - horizontal bars and their footprint geometry

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::types::{PieceId, MAX_PIECE_WIDTH, MIN_PIECE_WIDTH};

/// A live piece: a 1xN horizontal bar sitting in exactly one row.
///
/// `width` is fixed at creation. `row` and `col` (leftmost cell) are updated in
/// place by the board when the piece slides, falls, or is shifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub row: usize,
    pub col: usize,
    pub width: u8,
}

impl Piece {
    pub fn new(id: PieceId, row: usize, col: usize, width: u8) -> Self {
        Self {
            id,
            row,
            col,
            width,
        }
    }

    /// Whether `width` is a legal piece width (1-4)
    pub fn valid_width(width: u8) -> bool {
        (MIN_PIECE_WIDTH..=MAX_PIECE_WIDTH).contains(&width)
    }

    /// Rightmost occupied column
    pub fn right(&self) -> usize {
        self.col + self.width as usize - 1
    }

    /// Columns covered by the piece
    pub fn span(&self) -> std::ops::RangeInclusive<usize> {
        self.col..=self.right()
    }

    /// Whether the piece covers cell (row, col)
    pub fn covers(&self, row: usize, col: usize) -> bool {
        self.row == row && self.span().contains(&col)
    }

    /// Cells occupied by the piece as (row, col) pairs, left to right.
    ///
    /// Stack-only: a piece never covers more than four cells.
    pub fn footprint(&self) -> ArrayVec<(usize, usize), { MAX_PIECE_WIDTH as usize }> {
        let mut cells = ArrayVec::new();
        for col in self.span() {
            cells.push((self.row, col));
        }
        cells
    }
}
