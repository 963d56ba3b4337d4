//! Reordering buffer for transcription results.
//!
//! Utterances are numbered in the order the segmenter completes them, but
//! transcription round-trips finish in whatever order the network allows.
//! Verdicts must be applied in completion order or a slow response for an
//! old utterance could overwrite a newer anchor. The resequencer holds
//! out-of-order arrivals until their predecessors have been released.

use std::collections::BTreeMap;

/// Reorders `(sequence, value)` pairs into contiguous sequence order.
#[derive(Debug)]
pub struct Resequencer<T> {
    next: u64,
    pending: BTreeMap<u64, T>,
}

impl<T> Resequencer<T> {
    /// Creates a resequencer expecting sequence numbers from 0.
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Accepts one arrival and returns every value that is now releasable,
    /// in sequence order.
    ///
    /// Arrivals below the release cursor (duplicates of already-released
    /// sequences) are dropped.
    pub fn push(&mut self, sequence: u64, value: T) -> Vec<T> {
        if sequence < self.next {
            return Vec::new();
        }
        self.pending.insert(sequence, value);

        let mut ready = Vec::new();
        while let Some(value) = self.pending.remove(&self.next) {
            ready.push(value);
            self.next += 1;
        }
        ready
    }

    /// Number of arrivals waiting on a missing predecessor.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The sequence number that must arrive before anything is released.
    pub fn awaiting(&self) -> u64 {
        self.next
    }
}

impl<T> Default for Resequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}
