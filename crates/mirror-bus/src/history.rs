//! # Delivery History
//!
//! Bounded ring buffer of recent deliveries, kept for diagnostics.

use mirror_types::{now_ms, Domain, EventKind};
use std::collections::VecDeque;

/// One delivery record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    /// Kind of the delivered event.
    pub kind: EventKind,
    /// Number of handlers the event was delivered to.
    pub handler_count: usize,
    /// Domain from the event's chain metadata, if any.
    pub domain: Option<Domain>,
    /// Delivery timestamp (milliseconds since epoch).
    pub timestamp_ms: u64,
}

/// Bounded ring buffer of the last N delivery records.
#[derive(Debug)]
pub struct DeliveryHistory {
    records: VecDeque<DeliveryRecord>,
    capacity: usize,
}

impl DeliveryHistory {
    /// Create a history with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a delivery, evicting the oldest record when full.
    pub fn record(&mut self, kind: EventKind, handler_count: usize, domain: Option<Domain>) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(DeliveryRecord {
            kind,
            handler_count,
            domain,
            timestamp_ms: now_ms(),
        });
    }

    /// Recorded deliveries, oldest first.
    #[must_use]
    pub fn records(&self) -> impl Iterator<Item = &DeliveryRecord> {
        self.records.iter()
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether any deliveries were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_len() {
        let mut history = DeliveryHistory::new(8);
        assert!(history.is_empty());

        history.record(EventKind::StateChanged, 2, Some(Domain::Geometry));
        assert_eq!(history.len(), 1);

        let record = history.records().next().unwrap();
        assert_eq!(record.kind, EventKind::StateChanged);
        assert_eq!(record.handler_count, 2);
        assert_eq!(record.domain, Some(Domain::Geometry));
    }

    #[test]
    fn test_ring_eviction() {
        let mut history = DeliveryHistory::new(3);
        for count in 0..5 {
            history.record(EventKind::Flush, count, None);
        }

        assert_eq!(history.len(), 3);
        // Oldest two (0, 1) evicted
        let counts: Vec<usize> = history.records().map(|r| r.handler_count).collect();
        assert_eq!(counts, vec![2, 3, 4]);
    }
}
