//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are plain data with no behavior beyond small helpers, so they can be
//! shared between the simulation core, the runtime adapter, and any presentation layer.
//!
//! # Board Dimensions
//!
//! The default playfield is 8 rows by 10 columns:
//!
//! - **Rows**: indexed 0-7, row 0 is the bottom row
//! - **Columns**: indexed 0-9, left to right
//! - **Pieces**: horizontal bars 1-4 cells wide, always contained in a single row
//!
//! Gravity pulls pieces toward row 0. Row injection pushes every piece one row up
//! and fills row 0 with fresh pieces.
//!
//! # Presentation Pacing
//!
//! Durations (milliseconds) a presentation layer waits after each kind of board
//! mutation before the settle loop is allowed to continue:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `SLIDE_PAUSE_MS` | 0 | Player slide is already animated by the drag |
//! | `DROP_PAUSE_MS` | 500 | Pieces falling into gaps |
//! | `CLEAR_PAUSE_MS` | 200 | Full rows vanishing |
//! | `INJECT_PAUSE_MS` | 200 | Rows shifting up and the new bottom row appearing |
//!
//! # Examples
//!
//! ```
//! use tetra_slide_types::{BoardDelta, CellState, DeltaKind, PieceId, BOARD_COLUMNS, BOARD_ROWS};
//!
//! assert_eq!(BOARD_ROWS, 8);
//! assert_eq!(BOARD_COLUMNS, 10);
//!
//! assert!(CellState::Occupied.is_occupied());
//! assert_eq!(CellState::Empty.as_u8(), 0);
//!
//! let delta = BoardDelta::new(DeltaKind::Clear);
//! assert!(delta.is_empty());
//! assert_eq!(PieceId(7).to_string(), "#7");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Board height in cells (8 rows)
pub const BOARD_ROWS: usize = 8;

/// Board width in cells (10 columns)
pub const BOARD_COLUMNS: usize = 10;

/// Narrowest piece (1 cell)
pub const MIN_PIECE_WIDTH: u8 = 1;

/// Widest piece (4 cells)
pub const MAX_PIECE_WIDTH: u8 = 4;

/// Placement attempts the row packer makes before giving up on its fill target
pub const INJECT_ATTEMPTS: u32 = 50;

/// Lower bound of the sampled bottom-row fill fraction
pub const FILL_DENSITY_MIN: f32 = 0.5;

/// Upper bound of the sampled bottom-row fill fraction
pub const FILL_DENSITY_MAX: f32 = 0.9;

/// Rows (counted from the bottom) eligible for initial seeding
pub const INITIAL_SPAWN_ROWS: usize = 3;

/// Inclusive range of pieces seeded when a game starts
pub const INITIAL_PIECES_MIN: u32 = 3;
pub const INITIAL_PIECES_MAX: u32 = 5;

/// Placement attempts per seeded piece
pub const INITIAL_PIECE_ATTEMPTS: u32 = 50;

pub const SLIDE_PAUSE_MS: u64 = 0;
pub const DROP_PAUSE_MS: u64 = 500;
pub const CLEAR_PAUSE_MS: u64 = 200;
pub const INJECT_PAUSE_MS: u64 = 200;
pub const SPAWN_PAUSE_MS: u64 = 0;


/// State of a single grid cell
///
/// The grid is a derived index over the live pieces: a cell is `Occupied`
/// exactly when some piece's footprint covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Empty,
    Occupied,
}

impl CellState {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellState::Empty)
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, CellState::Occupied)
    }

    /// Compact encoding used by snapshots (0 = empty, 1 = occupied)
    pub fn as_u8(&self) -> u8 {
        match self {
            CellState::Empty => 0,
            CellState::Occupied => 1,
        }
    }
}

/// Stable identity of a live piece.
///
/// Ids are handed out by the board in increasing order and never reused, so a
/// presentation layer can key its sprites on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceId(pub u32);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Phases of the settle loop state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlePhase {
    #[default]
    Idle,
    Dropping,
    Clearing,
    Injecting,
}

impl SettlePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlePhase::Idle => "idle",
            SettlePhase::Dropping => "dropping",
            SettlePhase::Clearing => "clearing",
            SettlePhase::Injecting => "injecting",
        }
    }
}

/// Which board operation produced a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaKind {
    /// Initial pieces placed when a game starts
    Spawn,
    /// A player moved a piece horizontally
    Slide,
    /// Gravity pass
    Drop,
    /// Line-clear pass
    Clear,
    /// Rows shifted up and a new bottom row was generated
    Inject,
}

impl DeltaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaKind::Spawn => "spawn",
            DeltaKind::Slide => "slide",
            DeltaKind::Drop => "drop",
            DeltaKind::Clear => "clear",
            DeltaKind::Inject => "inject",
        }
    }
}

/// Vertical displacement of one piece (drop or shift)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceMove {
    pub piece: PieceId,
    pub from_row: usize,
    pub to_row: usize,
}

/// Horizontal displacement of one piece within its row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceSlide {
    pub piece: PieceId,
    pub row: usize,
    pub from_col: usize,
    pub to_col: usize,
}

/// Everything one discrete board mutation changed.
///
/// Exactly one delta is produced per mutation so a presentation layer can
/// animate from it without polling the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardDelta {
    pub kind: DeltaKind,
    /// Pieces that fell (drop pass)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moved: Vec<PieceMove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slid: Option<PieceSlide>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleared_rows: Vec<usize>,
    /// Pieces destroyed by a clear or by crossing the top boundary
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<PieceId>,
    /// Pieces created by seeding or injection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub injected: Vec<PieceId>,
    /// Pieces pushed up one row by injection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shifted: Vec<PieceMove>,
}

impl BoardDelta {
    pub fn new(kind: DeltaKind) -> Self {
        Self {
            kind,
            moved: Vec::new(),
            slid: None,
            cleared_rows: Vec::new(),
            removed: Vec::new(),
            injected: Vec::new(),
            shifted: Vec::new(),
        }
    }

    /// True when the mutation changed nothing
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty()
            && self.slid.is_none()
            && self.cleared_rows.is_empty()
            && self.removed.is_empty()
            && self.injected.is_empty()
            && self.shifted.is_empty()
    }
}
