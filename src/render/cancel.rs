//! Cooperative cancellation, polled by the render loops between grains.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared flag; cloning shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag so the next render can run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}
