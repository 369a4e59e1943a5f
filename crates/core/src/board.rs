//! Board module - grid occupancy plus the authoritative set of live pieces
//!
//! The grid is a flat row-major array of [`CellState`] (row 0 is the bottom row).
//! It is a derived index over the piece list: every mutation updates both in the
//! same call, and debug builds re-derive the grid from the pieces after each
//! mutating operation to catch drift.
//!
//! Query coordinates are `i32` so that neighbour probes one step outside the
//! board (column -1, row -1) return the out-of-bounds sentinel instead of
//! wrapping.

use std::fmt;
use std::ops::RangeInclusive;

use log::{debug, trace};

use crate::error::InvariantViolation;
use crate::piece::Piece;
use crate::types::{CellState, PieceId, PieceMove, PieceSlide, BOARD_COLUMNS, BOARD_ROWS};

/// Outcome of one line-clear pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearResult {
    /// Cleared row indices, bottom to top
    pub rows: Vec<usize>,
    /// Pieces destroyed with those rows
    pub removed: Vec<PieceId>,
}

impl ClearResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of shifting every row up by one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftResult {
    /// Surviving pieces and their old/new rows
    pub shifted: Vec<PieceMove>,
    /// Pieces pushed past the top row
    pub removed: Vec<PieceId>,
}

/// The game board: `rows x columns` cells and the pieces covering them
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    rows: usize,
    columns: usize,
    /// Flat array of cells, row-major order (row * columns + col)
    cells: Vec<CellState>,
    pieces: Vec<Piece>,
    next_id: u32,
}

impl Board {
    /// Create a new empty board
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![CellState::Empty; rows * columns],
            pieces: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a board from `(row, col, width)` placements.
    ///
    /// The grid is derived from the resulting piece set, and the whole board is
    /// validated before it is returned.
    pub fn from_pieces(
        rows: usize,
        columns: usize,
        placements: &[(usize, usize, u8)],
    ) -> Result<Self, InvariantViolation> {
        let mut board = Self::new(rows, columns);
        for &(row, col, width) in placements {
            let id = board.allocate_id();
            board.pieces.push(Piece::new(id, row, col, width));
        }
        board.check_layout()?;
        board.rebuild_grid();
        Ok(board)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Calculate flat index from (row, col), None if out of bounds
    #[inline(always)]
    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.columns {
            return None;
        }
        Some(row as usize * self.columns + col as usize)
    }

    #[inline(always)]
    fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.columns);
        row * self.columns + col
    }

    #[inline(always)]
    fn cell(&self, row: usize, col: usize) -> CellState {
        self.cells[self.idx(row, col)]
    }

    /// Get cell at (row, col). Returns None if out of bounds.
    pub fn get(&self, row: i32, col: i32) -> Option<CellState> {
        self.index(row, col).map(|i| self.cells[i])
    }

    /// Whether (row, col) is inside the board and empty
    pub fn is_free(&self, row: i32, col: i32) -> bool {
        matches!(self.get(row, col), Some(CellState::Empty))
    }

    /// Raw write of one cell. Returns false if out of bounds.
    ///
    /// This does not touch the piece set; callers that use it directly must keep
    /// the two in step ([`Board::check_invariants`] reports any drift).
    pub fn set_cell(&mut self, row: i32, col: i32, state: CellState) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i] = state;
                true
            }
            None => false,
        }
    }

    /// Apply several raw writes as one unit. Out-of-bounds entries are skipped.
    ///
    /// Returns the number of cells written.
    pub fn batch_set(&mut self, updates: &[(i32, i32, CellState)]) -> usize {
        let mut written = 0;
        for &(row, col, state) in updates {
            if self.set_cell(row, col, state) {
                written += 1;
            }
        }
        trace!("batch_set wrote {}/{} cells", written, updates.len());
        written
    }

    fn fill_span(&mut self, row: usize, col: usize, width: u8, state: CellState) {
        let start = self.idx(row, col);
        for cell in &mut self.cells[start..start + width as usize] {
            *cell = state;
        }
    }

    fn span_is_empty(&self, row: usize, col: usize, width: u8) -> bool {
        let start = self.idx(row, col);
        self.cells[start..start + width as usize]
            .iter()
            .all(|c| c.is_empty())
    }

    /// True iff all `width` cells starting at (row, col) are in bounds and empty
    pub fn area_is_free(&self, row: i32, col: i32, width: u8) -> bool {
        if width == 0 {
            return false;
        }
        (0..width as i32).all(|dc| self.is_free(row, col + dc))
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, row: usize) -> bool {
        if row >= self.rows {
            return false;
        }
        let start = row * self.columns;
        self.cells[start..start + self.columns]
            .iter()
            .all(|c| c.is_occupied())
    }

    /// Rows that the next clear pass would remove, bottom to top
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.rows).filter(|&row| self.is_row_full(row)).collect()
    }

    fn allocate_id(&mut self) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Place a new piece if the width is legal and the area is free
    pub fn spawn_piece(&mut self, row: usize, col: usize, width: u8) -> Option<PieceId> {
        if !Piece::valid_width(width)
            || row >= self.rows
            || !self.area_is_free(row as i32, col as i32, width)
        {
            return None;
        }

        let id = self.allocate_id();
        self.fill_span(row, col, width, CellState::Occupied);
        self.pieces.push(Piece::new(id, row, col, width));
        trace!("spawned piece {} width {} at ({}, {})", id, width, row, col);
        self.debug_check("spawn_piece");
        Some(id)
    }

    /// Live pieces in no particular order
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    fn position(&self, id: PieceId) -> Option<usize> {
        self.pieces.iter().position(|p| p.id == id)
    }

    /// Pieces whose row is `row`, left to right
    pub fn pieces_in_row(&self, row: usize) -> Vec<Piece> {
        let mut found: Vec<Piece> = self.pieces.iter().filter(|p| p.row == row).copied().collect();
        found.sort_by_key(|p| p.col);
        found
    }

    /// Piece covering (row, col), by linear scan
    pub fn find_piece(&self, row: i32, col: i32) -> Option<PieceId> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        self.pieces.iter().find(|p| p.covers(row, col)).map(|p| p.id)
    }

    /// Leftmost and rightmost cell the piece could cover by sliding in its row.
    ///
    /// Scans outward from the piece's edges and stops at the first occupied cell
    /// or the board edge.
    pub fn movable_range(&self, id: PieceId) -> Option<(usize, usize)> {
        let p = *self.piece(id)?;

        let mut min = p.col;
        while min > 0 && self.cell(p.row, min - 1).is_empty() {
            min -= 1;
        }

        let mut max = p.right();
        while max + 1 < self.columns && self.cell(p.row, max + 1).is_empty() {
            max += 1;
        }

        Some((min, max))
    }

    /// Legal leftmost columns for the piece, derived from [`Board::movable_range`]
    pub fn target_cols(&self, id: PieceId) -> Option<RangeInclusive<usize>> {
        let width = self.piece(id)?.width as usize;
        let (min, max) = self.movable_range(id)?;
        Some(min..=max + 1 - width)
    }

    /// Slide a piece to `target_col` within its row.
    ///
    /// The target is clamped into [`Board::target_cols`], so an out-of-range
    /// request moves the piece as far as it can go. Returns None if the piece
    /// does not exist or ends up where it started.
    pub fn move_piece(&mut self, id: PieceId, target_col: i32) -> Option<PieceSlide> {
        let range = self.target_cols(id)?;
        let target = target_col.clamp(*range.start() as i32, *range.end() as i32) as usize;

        let i = self.position(id)?;
        let p = self.pieces[i];
        if target == p.col {
            return None;
        }

        self.fill_span(p.row, p.col, p.width, CellState::Empty);
        self.fill_span(p.row, target, p.width, CellState::Occupied);
        self.pieces[i].col = target;
        self.debug_check("move_piece");

        Some(PieceSlide {
            piece: id,
            row: p.row,
            from_col: p.col,
            to_col: target,
        })
    }

    /// Lowest row the piece reaches by falling through consecutive empty rows.
    ///
    /// The scan stops at the first row that is not entirely free under the
    /// piece's span; a piece never passes an obstruction to reach a gap below it.
    fn landing_row(&self, p: &Piece) -> usize {
        let mut row = p.row;
        while row > 0 && self.span_is_empty(row - 1, p.col, p.width) {
            row -= 1;
        }
        row
    }

    /// Pieces sorted bottom row first (ties by id)
    fn bottom_up_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.pieces.len()).collect();
        order.sort_by_key(|&i| (self.pieces[i].row, self.pieces[i].id));
        order
    }

    /// Where each piece would land if it alone were allowed to fall now.
    ///
    /// Non-mutating; every piece is judged against the current grid, so pieces
    /// stacked above a falling piece are reported as blocked.
    pub fn preview_drops(&self) -> Vec<PieceMove> {
        self.bottom_up_order()
            .into_iter()
            .filter_map(|i| {
                let p = &self.pieces[i];
                let to_row = self.landing_row(p);
                (to_row < p.row).then_some(PieceMove {
                    piece: p.id,
                    from_row: p.row,
                    to_row,
                })
            })
            .collect()
    }

    /// Let every piece fall, bottom row first.
    ///
    /// Processing order matters: a lower piece vacates its cells before the
    /// pieces above it are examined, so a whole stack falls in one pass.
    /// Returns only the pieces that moved.
    pub fn resolve_drops(&mut self) -> Vec<PieceMove> {
        let mut moves = Vec::new();

        for i in self.bottom_up_order() {
            let p = self.pieces[i];
            let to_row = self.landing_row(&p);
            if to_row >= p.row {
                continue;
            }

            self.fill_span(p.row, p.col, p.width, CellState::Empty);
            self.fill_span(to_row, p.col, p.width, CellState::Occupied);
            self.pieces[i].row = to_row;
            trace!("piece {} fell from row {} to row {}", p.id, p.row, to_row);

            moves.push(PieceMove {
                piece: p.id,
                from_row: p.row,
                to_row,
            });
        }

        if !moves.is_empty() {
            debug!("drop pass moved {} piece(s)", moves.len());
            self.debug_check("resolve_drops");
        }
        moves
    }

    /// Clear every full row and destroy the pieces on it.
    ///
    /// Rows above a cleared row do not move; the next drop pass handles that.
    pub fn resolve_clears(&mut self) -> ClearResult {
        let rows = self.full_rows();
        if rows.is_empty() {
            return ClearResult::default();
        }

        for &row in &rows {
            let start = row * self.columns;
            for cell in &mut self.cells[start..start + self.columns] {
                *cell = CellState::Empty;
            }
        }

        let mut removed = Vec::new();
        self.pieces.retain(|p| {
            if rows.contains(&p.row) {
                removed.push(p.id);
                false
            } else {
                true
            }
        });

        debug!("cleared rows {:?}, removed {} piece(s)", rows, removed.len());
        self.debug_check("resolve_clears");
        ClearResult { rows, removed }
    }

    /// Move every piece up one row and empty row 0.
    ///
    /// Pieces pushed past the top row are destroyed.
    pub fn shift_rows_up_and_clear_bottom(&mut self) -> ShiftResult {
        let mut result = ShiftResult::default();
        let rows = self.rows;

        self.pieces.retain_mut(|p| {
            let from_row = p.row;
            p.row += 1;
            if p.row >= rows {
                result.removed.push(p.id);
                false
            } else {
                result.shifted.push(PieceMove {
                    piece: p.id,
                    from_row,
                    to_row: p.row,
                });
                true
            }
        });

        // Shift grid rows up by one (copy_within handles the overlap), then
        // clear the bottom row.
        let width = self.columns;
        if rows > 1 {
            self.cells.copy_within(0..(rows - 1) * width, width);
        }
        for cell in &mut self.cells[0..width.min(rows * width)] {
            *cell = CellState::Empty;
        }

        debug!(
            "shifted {} piece(s) up, {} lost off the top",
            result.shifted.len(),
            result.removed.len()
        );
        self.debug_check("shift_rows_up_and_clear_bottom");
        result
    }

    /// Destroy every piece and empty the grid
    pub fn clear(&mut self) {
        self.pieces.clear();
        for cell in &mut self.cells {
            *cell = CellState::Empty;
        }
    }

    /// Recompute the grid from the piece set
    pub fn rebuild_grid(&mut self) {
        for cell in &mut self.cells {
            *cell = CellState::Empty;
        }
        for i in 0..self.pieces.len() {
            let p = self.pieces[i];
            self.fill_span(p.row, p.col, p.width, CellState::Occupied);
        }
    }

    /// Validate piece widths, bounds, ids, and overlaps (ignores the grid)
    fn check_layout(&self) -> Result<Vec<Option<PieceId>>, InvariantViolation> {
        let mut owner: Vec<Option<PieceId>> = vec![None; self.rows * self.columns];

        let mut ids: Vec<PieceId> = self.pieces.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(InvariantViolation::DuplicateId { piece: pair[0] });
        }

        for p in &self.pieces {
            if !Piece::valid_width(p.width) {
                return Err(InvariantViolation::BadWidth {
                    piece: p.id,
                    width: p.width,
                });
            }
            if p.row >= self.rows || p.right() >= self.columns {
                return Err(InvariantViolation::OutOfBounds {
                    piece: p.id,
                    row: p.row,
                    col: p.col,
                    right: p.right(),
                });
            }
            for (row, col) in p.footprint() {
                let i = self.idx(row, col);
                if let Some(first) = owner[i] {
                    return Err(InvariantViolation::Overlap {
                        first,
                        second: p.id,
                        row,
                        col,
                    });
                }
                owner[i] = Some(p.id);
            }
        }

        Ok(owner)
    }

    /// Verify that pieces are in bounds, never overlap, and that the grid is
    /// exactly the union of their footprints.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let owner = self.check_layout()?;

        for (i, (cell, owned)) in self.cells.iter().zip(owner.iter()).enumerate() {
            if cell.is_occupied() != owned.is_some() {
                let name = |occupied: bool| if occupied { "occupied" } else { "empty" };
                return Err(InvariantViolation::GridDrift {
                    row: i / self.columns,
                    col: i % self.columns,
                    expected: name(owned.is_some()),
                    found: name(cell.is_occupied()),
                });
            }
        }
        Ok(())
    }

    #[inline]
    fn debug_check(&self, op: &str) {
        if cfg!(debug_assertions) {
            if let Err(e) = self.check_invariants() {
                panic!("board invariant broken by {}: {}", op, e);
            }
        }
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Write the grid as 0/1 rows (bottom row first) into `out`, reusing its allocations
    pub fn write_u8_grid(&self, out: &mut Vec<Vec<u8>>) {
        out.resize_with(self.rows, Vec::new);
        for (row, dst) in out.iter_mut().enumerate() {
            let start = row * self.columns;
            dst.clear();
            dst.extend(self.cells[start..start + self.columns].iter().map(|c| c.as_u8()));
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_ROWS, BOARD_COLUMNS)
    }
}

/// Top row first, `#` for occupied and `.` for empty
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.rows).rev() {
            write!(f, "{:>2} ", row)?;
            for col in 0..self.columns {
                let ch = if self.cell(row, col).is_occupied() { '#' } else { '.' };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
