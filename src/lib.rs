//! Tetra Slide (workspace facade crate).
//!
//! Re-exports the member crates as `tetra_slide::{core,adapter,types}` so that
//! the binary, integration tests, and benches share one import path.

pub use tetra_slide_adapter as adapter;
pub use tetra_slide_core as core;
pub use tetra_slide_types as types;
