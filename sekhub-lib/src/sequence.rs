use std::sync::atomic::{AtomicU8, Ordering};

/// Cyclic 8-bit frame sequence counter.
///
/// Starts at 0 and is bumped before every frame build, so the first frame
/// carries sequence 1. One counter is shared by every frame builder of the
/// process; the increment is a single atomic operation.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    value: AtomicU8,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Counter whose next value will be `start + 1`
    pub fn starting_at(start: u8) -> Self {
        Self {
            value: AtomicU8::new(start),
        }
    }

    /// Advance and return the new sequence number
    pub fn next(&self) -> u8 {
        // fetch_add wraps on overflow
        self.value.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Last value handed out (0 before the first frame)
    pub fn current(&self) -> u8 {
        self.value.load(Ordering::Relaxed)
    }
}
