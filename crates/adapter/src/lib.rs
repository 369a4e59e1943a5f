//! Adapter module - paced presentation and delta logging around the core
//!
//! The core applies every settle step synchronously. This crate turns that into
//! an animated sequence: the [`runtime::PacedDriver`] applies one mutation, hands
//! the resulting delta to a presenter task, and waits for the presenter to
//! signal that the animation finished before applying the next one. The board
//! stays locked for the whole run, so moves arriving mid-animation are rejected.
//!
//! # Flow
//!
//! ```text
//! begin_start -> Spawn frame (locked), then the drain below without injection
//! move_request -> Slide frame
//! begin_settle
//! loop: advance_settle -> Drop/Clear/Inject frame -> await completion
//! advance_settle == None -> lock released
//! ```
//!
//! If the presenter disappears, the driver keeps stepping until the board is
//! quiet. A started settle run is never cancelled.
//!
//! # Environment Variables
//!
//! - `TETRA_ROWS`, `TETRA_COLUMNS`: board size (default 8 x 10)
//! - `TETRA_SEED`: RNG seed (default 1)
//! - `TETRA_INJECT_ATTEMPTS`: packer attempt budget (default 50)
//! - `TETRA_FILL_MIN`, `TETRA_FILL_MAX`: injected row density range (default 0.5 - 0.9)
//! - `TETRA_TURNS`: autoplay turns (default 20)
//! - `TETRA_PACED`: set to "1" or "true" to sleep through animation pauses
//! - `TETRA_DELTA_LOG_PATH`: append every delta as a JSON line to this file
//!
//! # Delta Log Format
//!
//! ```text
//! {"seq":1,"delta":{"kind":"slide","slid":{"piece":4,"row":1,"from_col":0,"to_col":6}}}
//! {"seq":2,"delta":{"kind":"drop","moved":[{"piece":4,"from_row":1,"to_row":0}]}}
//! {"seq":3,"delta":{"kind":"clear","cleared_rows":[0],"removed":[1,2,3,4]}}
//! ```

pub mod config;
pub mod delta_log;
pub mod runtime;

pub use tetra_slide_core as core;
pub use tetra_slide_types as types;

pub use config::{Pacing, RuntimeConfig};
pub use delta_log::{DeltaLog, DeltaRecord};
pub use runtime::{spawn_timed_presenter, Frame, PacedDriver};
