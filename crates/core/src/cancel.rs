//! Cooperative cancellation
//!
//! One shared atomic flag per run. The caller sets it out of band; validate,
//! execute and worker code only read it, at every loop or chunk boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, cheaply clonable cancel flag
///
/// Clones observe the same flag. Reads never block.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Poll the flag
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clear a previous request so the flag can be reused for another run
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// `Err(Error::Cancelled)` if the flag is set
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(crate::Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
