//! Sparse out-of-order segment buffer: holds segments with `seq >
//! expected_seq` pending in-order delivery.
//!
//! A `BTreeMap` keyed by sequence number, with a drain-while-contiguous
//! delivery loop. Insertion is gated by a byte-capacity check — admission
//! compares *bytes*, not entry count, against the available capacity.

use std::collections::BTreeMap;

use bytes::Bytes;

/// Buffer for segments with `seq > expected_seq`, pending in-order delivery.
#[derive(Default)]
pub struct ReorderBuffer {
    pending: BTreeMap<i32, Bytes>,
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
        }
    }

    /// Total bytes currently buffered.
    pub fn byte_len(&self) -> usize {
        self.pending.values().map(|b| b.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Insert a segment if there's room for it within `capacity_bytes`
    /// (measured over the buffer's contents *after* the insert). Returns
    /// `true` if accepted, `false` if the segment was discarded for lack of
    /// space.
    pub fn try_insert(&mut self, seq: i32, payload: Bytes, capacity_bytes: usize) -> bool {
        if self.pending.contains_key(&seq) {
            // Already buffered; treat as accepted (idempotent duplicate).
            return true;
        }
        if self.byte_len() + payload.len() > capacity_bytes {
            return false;
        }
        self.pending.insert(seq, payload);
        true
    }

    /// Drain all segments starting at `expected_seq` that are now
    /// contiguous, returning them in order and the updated next-expected
    /// sequence number.
    pub fn drain_contiguous(&mut self, mut expected_seq: i32) -> (Vec<Bytes>, i32) {
        let mut delivered = Vec::new();
        while let Some(payload) = self.pending.remove(&expected_seq) {
            delivered.push(payload);
            expected_seq += 1;
        }
        (delivered, expected_seq)
    }
}
