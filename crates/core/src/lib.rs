//! Core board logic - pure, deterministic, and testable
//!
//! This crate contains the sliding-block board rules and the settle state
//! machine. It has no dependencies on rendering, timing, or I/O:
//!
//! - **Deterministic**: the same seed reproduces the same game
//! - **Synchronous**: every operation runs to completion; pacing lives in the adapter
//! - **Self-checking**: debug builds re-derive the grid after each mutation
//!
//! # Module Structure
//!
//! - [`board`]: occupancy grid plus the live piece set; drops, clears, row shift
//! - [`settle`]: drop/clear/inject state machine driven after every move
//! - [`injector`]: shifts the board up and packs a new random bottom row
//! - [`lock`]: the processing lock that serializes settle runs and moves
//! - [`game_state`]: session facade returning a [`BoardDelta`](types::BoardDelta) per mutation
//! - [`piece`], [`rng`], [`config`], [`snapshot`], [`error`]
//!
//! # Board Rules
//!
//! - Pieces are horizontal runs 1-4 cells wide; they never overlap.
//! - A piece slides left or right within its row until it meets another piece.
//! - Pieces fall, bottom row first, through consecutive empty rows only.
//! - A fully occupied row is cleared and its pieces destroyed; rows above stay put
//!   until the next drop pass.
//! - After the board goes quiet, every row shifts up, anything pushed past the
//!   top is lost, and a fresh bottom row is injected.
//!
//! # Example
//!
//! ```
//! use tetra_slide_core::{Board, GameConfig, GameState};
//! use tetra_slide_types::DeltaKind;
//!
//! // A full bottom row except column 9, and a single ready to slide into it
//! let board = Board::from_pieces(8, 10, &[(0, 0, 4), (0, 4, 4), (0, 8, 1), (1, 0, 1)]).unwrap();
//! let mut game = GameState::from_board(GameConfig::default(), board).unwrap();
//!
//! let single = game.pieces_in_row(1)[0].id;
//! let deltas = game.play(single, 9).unwrap();
//!
//! assert_eq!(deltas[0].kind, DeltaKind::Slide);
//! assert!(deltas.iter().any(|d| d.kind == DeltaKind::Clear));
//! assert!(!game.is_settling());
//! ```

pub mod board;
pub mod config;
pub mod error;
pub mod game_state;
pub mod injector;
pub mod lock;
pub mod piece;
pub mod rng;
pub mod settle;
pub mod snapshot;

pub use tetra_slide_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, ClearResult, ShiftResult};
pub use config::GameConfig;
pub use error::{ConfigError, InvariantViolation};
pub use game_state::GameState;
pub use injector::RowInjector;
pub use lock::{ProcessingGuard, ProcessingLock};
pub use piece::Piece;
pub use rng::SimpleRng;
pub use settle::SettleLoop;
pub use snapshot::BoardSnapshot;
