//! Unacked-segment bookkeeping for the retransmission-timeout scan.
//!
//! A `BinaryHeap` ordered by send time gives O(log n) access to the oldest
//! outstanding segment, backed by a `HashMap` holding the live entries.
//! Entries are lazily deleted: a heap-popped seq that's no longer in the map
//! (already ACKed, or replaced by a later retransmission record) is simply
//! skipped.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use bytes::Bytes;

/// A segment awaiting acknowledgement.
#[derive(Debug, Clone)]
pub struct Unacked {
    pub payload: Bytes,
    pub sent_at: Instant,
    /// Set once this segment has been retransmitted at least once. Per
    /// Karn's rule, an ACK covering a segment with this flag set must not be
    /// used to produce an RTT sample.
    pub retransmitted: bool,
    /// Number of times this segment has been retransmitted (not counting the
    /// original send).
    pub retry_count: u32,
}

/// Tracks segments sent but not yet cumulatively ACKed.
#[derive(Default)]
pub struct RetransmitTable {
    entries: HashMap<i32, Unacked>,
    heap: BinaryHeap<Reverse<(Instant, i32)>>,
}

impl RetransmitTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            heap: BinaryHeap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, seq: i32) -> bool {
        self.entries.contains_key(&seq)
    }

    /// Record a freshly sent segment.
    pub fn insert(&mut self, seq: i32, payload: Bytes, sent_at: Instant) {
        self.heap.push(Reverse((sent_at, seq)));
        self.entries.insert(
            seq,
            Unacked {
                payload,
                sent_at,
                retransmitted: false,
                retry_count: 0,
            },
        );
    }

    /// Mark a segment as retransmitted, refreshing its send time and
    /// clearing it for a fresh RTO, but setting the Karn's-rule flag so its
    /// eventual ACK doesn't feed the RTT estimator. Returns the segment's
    /// updated retry count.
    pub fn mark_retransmitted(&mut self, seq: i32, now: Instant) -> u32 {
        if let Some(entry) = self.entries.get_mut(&seq) {
            entry.sent_at = now;
            entry.retransmitted = true;
            entry.retry_count += 1;
            self.heap.push(Reverse((now, seq)));
            entry.retry_count
        } else {
            0
        }
    }

    /// Remove every entry with `seq <= ack` (cumulative ACK), returning
    /// whether each removed segment had been retransmitted (for Karn's rule)
    /// together with its original send time (for an RTT sample).
    pub fn ack_through(&mut self, ack: i32) -> Vec<(i32, Instant, bool)> {
        let acked_seqs: Vec<i32> = self
            .entries
            .keys()
            .copied()
            .filter(|&seq| seq <= ack)
            .collect();
        acked_seqs
            .into_iter()
            .filter_map(|seq| {
                self.entries
                    .remove(&seq)
                    .map(|e| (seq, e.sent_at, e.retransmitted))
            })
            .collect()
    }

    /// The oldest live unacked segment whose RTO has elapsed as of `now`,
    /// skipping lazily-deleted (already-ACKed) heap entries.
    pub fn oldest_expired(&mut self, now: Instant, rto: Duration) -> Option<(i32, Bytes)> {
        while let Some(Reverse((sent_at, seq))) = self.heap.peek().copied() {
            match self.entries.get(&seq) {
                Some(entry) if entry.sent_at == sent_at => {
                    if now.duration_since(sent_at) >= rto {
                        return Some((seq, entry.payload.clone()));
                    }
                    return None;
                }
                _ => {
                    // Stale heap entry: either already ACKed, or superseded
                    // by a later retransmission record for the same seq.
                    self.heap.pop();
                }
            }
        }
        None
    }

    pub fn get(&self, seq: i32) -> Option<&Unacked> {
        self.entries.get(&seq)
    }
}
