//! Ring buffer for trace records.
//!
//! Stores the most recent records up to a fixed size. Records keep a link to
//! the record they descend from, so a search branch can be read back as a
//! path from its analysis start.

use std::collections::{BTreeMap, VecDeque};

use morphon_rules::TraceNodeId;

use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Trace Buffer
// =============================================================================

/// A ring buffer for storing trace records.
///
/// Maintains a fixed maximum size, discarding oldest records when full.
#[derive(Clone, Debug)]
pub struct TraceBuffer {
    /// The records, oldest first. IDs are consecutive.
    records: VecDeque<TraceRecord>,
    /// Maximum number of records to store.
    max_size: usize,
    /// Next record ID to assign.
    next_id: u64,
}

impl TraceBuffer {
    /// Creates a new trace buffer with the given maximum size.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
            next_id: 0,
        }
    }

    /// Pushes a new event to the buffer.
    ///
    /// Returns the assigned record ID.
    pub fn push(&mut self, parent: Option<TraceNodeId>, timestamp_ns: u64, event: TraceEvent) -> TraceNodeId {
        let id = TraceNodeId(self.next_id);
        self.next_id += 1;
        self.records.push_back(TraceRecord::new(id, parent, timestamp_ns, event));
        while self.records.len() > self.max_size {
            self.records.pop_front();
        }
        id
    }

    /// Returns the number of records in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Clears all records from the buffer.
    pub fn clear(&mut self) {
        self.records.clear();
        // IDs stay monotonic across clears.
    }

    /// Returns an iterator over all records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// Returns the record with `id` if it has not been evicted.
    #[must_use]
    pub fn get(&self, id: TraceNodeId) -> Option<&TraceRecord> {
        let oldest = self.records.front()?.id.0;
        let offset = usize::try_from(id.0.checked_sub(oldest)?).ok()?;
        self.records.get(offset)
    }

    /// Returns the records whose parent is `id`.
    #[must_use]
    pub fn children(&self, id: TraceNodeId) -> Vec<&TraceRecord> {
        self.filter(|r| r.parent == Some(id))
    }

    /// Returns the path from the oldest retained ancestor down to `id`.
    #[must_use]
    pub fn path(&self, id: TraceNodeId) -> Vec<&TraceRecord> {
        let mut path: Vec<&TraceRecord> =
            std::iter::successors(self.get(id), |record| record.parent.and_then(|p| self.get(p))).collect();
        path.reverse();
        path
    }

    /// Returns the number of ancestors of `id` still in the buffer.
    #[must_use]
    pub fn depth(&self, id: TraceNodeId) -> usize {
        self.path(id).len().saturating_sub(1)
    }

    /// Returns records matching a predicate.
    pub fn filter<F>(&self, predicate: F) -> Vec<&TraceRecord>
    where
        F: Fn(&TraceRecord) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Returns records of a specific event type.
    #[must_use]
    pub fn by_event_type(&self, event_type: &str) -> Vec<&TraceRecord> {
        self.filter(|r| r.event_type() == event_type)
    }

    /// Returns statistics about the buffer.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        let mut event_counts = BTreeMap::new();
        for record in &self.records {
            *event_counts.entry(record.event_type()).or_insert(0) += 1;
        }
        TraceBufferStats {
            record_count: self.records.len(),
            max_size: self.max_size,
            evicted: self.records.front().map_or(self.next_id, |r| r.id.0),
            event_counts,
        }
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new(10_000)
    }
}

// =============================================================================
// Buffer Statistics
// =============================================================================

/// Statistics about a trace buffer.
#[derive(Clone, Debug)]
pub struct TraceBufferStats {
    /// Number of records currently in buffer.
    pub record_count: usize,
    /// Maximum buffer size.
    pub max_size: usize,
    /// IDs assigned before the oldest retained record.
    pub evicted: u64,
    /// Count of each event type.
    pub event_counts: BTreeMap<&'static str, usize>,
}
