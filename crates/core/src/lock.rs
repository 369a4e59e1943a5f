//! Processing lock - the single board-wide mutation gate
//!
//! Acquiring the lock hands out an owned [`ProcessingGuard`]. The lock is held for
//! exactly as long as the guard lives, so storing the guard inside a running
//! state machine keeps the board locked across paced steps, and dropping it
//! (normally, or during a panic unwind) always releases it.
//!
//! Clones of a [`ProcessingLock`] observe the same gate, which lets a presentation
//! task ask "is the board settling?" without touching the board itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ProcessingLock {
    held: Arc<AtomicBool>,
}

impl ProcessingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or None if someone already holds it
    pub fn try_acquire(&self) -> Option<ProcessingGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingGuard {
                held: Arc::clone(&self.held),
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof that the processing lock is held. Releases it on drop.
#[derive(Debug)]
pub struct ProcessingGuard {
    held: Arc<AtomicBool>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
