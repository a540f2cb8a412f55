//! Derived statistics for note content.
//!
//! Word count and read time are never stored as a source of truth. The store
//! calls [`compute`] whenever content changes and again when state is loaded.

use serde::{Deserialize, Serialize};

/// Reading speed used for the read time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// Word count and estimated read time for a piece of content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteStats {
    pub word_count: usize,
    /// Whole minutes, rounded up.
    pub read_time: usize,
}

/// Counts whitespace-delimited words and derives the read time.
///
/// Empty or whitespace-only content has zero words and zero minutes. Any
/// other content reads in at least one minute.
pub fn compute(content: &str) -> NoteStats {
    let word_count = content.split_whitespace().count();
    NoteStats {
        word_count,
        read_time: word_count.div_ceil(WORDS_PER_MINUTE),
    }
}
