//! Collision-free names for per-archive output folders.
//!
//! Sibling archives often carry identical stream names, so each archive gets
//! its own token-named subfolder under both output roots. The token also
//! relates an unpack destination to its converted counterpart.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Hands out the tokens that name the paired raw/converted output folders.
///
/// Uniqueness within a run comes from the sequence counter, not from
/// randomness; the random run fragment only keeps successive runs against the
/// same output tree apart.
#[derive(Debug)]
pub struct TokenGenerator {
    run_id: String,
    sequence: AtomicU64,
}

impl TokenGenerator {
    pub fn new() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self {
            run_id: uuid[..8].to_string(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Next token, e.g. `3f9ac2d1-0007`.
    pub fn next(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:04}", self.run_id, seq)
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}
