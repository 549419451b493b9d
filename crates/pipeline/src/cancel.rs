//! Cooperative cancellation
//!
//! An external interrupt stops stages from issuing new network calls
//! but never interrupts an in-flight cache write; the flag is checked
//! between fetch units only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared run-cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
