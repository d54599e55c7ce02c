use crate::entry::LogEntry;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// Result of a single push into the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushReceipt {
    /// Sequence number stamped on the pushed entry
    pub seq: u64,
    /// Entries pushed since the last batch was taken
    pub unflushed: usize,
    /// True if the oldest entry was dropped to make room
    pub evicted: bool,
}

struct Ring {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
    unflushed: usize,
}

/// RingStore is the bounded in-memory buffer between emitters and the flusher
///
/// Architecture:
/// - Single `VecDeque` behind one mutex, capacity fixed at construction
/// - Push, take-batch, requeue, snapshot and clear are each one critical
///   section; none of them is held across an `.await`
/// - Overflow evicts from the front (oldest first), silently
///
/// Insertion order is chronological order. Every entry is stamped with a
/// monotonically increasing `seq` when it is pushed.
pub struct RingStore {
    ring: Mutex<Ring>,
    capacity: usize,
}

impl RingStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(Ring {
                entries: VecDeque::with_capacity(capacity),
                next_seq: 0,
                unflushed: 0,
            }),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one if the ring is full
    pub fn push(&self, entry: LogEntry) -> PushReceipt {
        let mut ring = self.ring.lock();
        self.push_locked(&mut ring, entry)
    }

    /// Like [`push`](Self::push) but gives up instead of waiting for the lock
    ///
    /// Returns `None` when the ring is locked, e.g. by the current thread.
    pub fn try_push(&self, entry: LogEntry) -> Option<PushReceipt> {
        let mut ring = self.ring.try_lock()?;
        Some(self.push_locked(&mut ring, entry))
    }

    fn push_locked(&self, ring: &mut Ring, mut entry: LogEntry) -> PushReceipt {
        let seq = ring.next_seq;
        ring.next_seq += 1;
        entry.seq = seq;

        let evicted = if ring.entries.len() >= self.capacity {
            ring.entries.pop_front();
            true
        } else {
            false
        };

        ring.entries.push_back(entry);
        ring.unflushed += 1;

        PushReceipt {
            seq,
            unflushed: ring.unflushed,
            evicted,
        }
    }

    /// Remove and return everything currently buffered, oldest first
    ///
    /// Entries pushed after this returns are not part of the batch.
    pub fn take_batch(&self) -> Vec<LogEntry> {
        let mut ring = self.ring.lock();
        ring.unflushed = 0;
        ring.entries.drain(..).collect()
    }

    /// Put a failed batch back in front of anything pushed since it was taken
    ///
    /// Returns the number of entries evicted to stay within capacity. Eviction
    /// follows the usual FIFO rule, so the oldest requeued entries go first.
    pub fn requeue_front(&self, batch: Vec<LogEntry>) -> usize {
        if batch.is_empty() {
            return 0;
        }

        let mut ring = self.ring.lock();
        let requeued = batch.len();
        for entry in batch.into_iter().rev() {
            ring.entries.push_front(entry);
        }

        let mut evicted = 0;
        while ring.entries.len() > self.capacity {
            ring.entries.pop_front();
            evicted += 1;
        }

        debug!(requeued, evicted, len = ring.entries.len(), "Batch requeued");
        evicted
    }

    /// Copy of the buffer, oldest first. Non-destructive.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.ring.lock().entries.iter().cloned().collect()
    }

    /// Drop every buffered entry, flushed or not. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut ring = self.ring.lock();
        let dropped = ring.entries.len();
        ring.entries.clear();
        ring.unflushed = 0;
        dropped
    }

    pub fn len(&self) -> usize {
        self.ring.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries pushed since the last [`take_batch`](Self::take_batch)
    pub fn unflushed(&self) -> usize {
        self.ring.lock().unflushed
    }

    /// Run `f` while the ring lock is held by the calling thread
    #[cfg(test)]
    pub(crate) fn with_locked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _ring = self.ring.lock();
        f()
    }
}
