//! # Cycle Guard
//!
//! Second-layer duplicate detection: catches update ids seen before even
//! across domains or after buffering, independent of the per-domain
//! chain-head check. Bounded: when the set exceeds `4 x max_depth` entries
//! it is FIFO-trimmed back to the most recent `max_depth`.

use crate::domain::MAX_CHAIN_DEPTH;
use mirror_types::UpdateId;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Bounded insertion-ordered set of recently applied update ids.
#[derive(Debug)]
pub struct CycleGuard {
    seen: HashSet<UpdateId>,
    order: VecDeque<UpdateId>,
    capacity: usize,
    keep: usize,
}

impl CycleGuard {
    /// Guard sized from the default chain depth cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_depth(MAX_CHAIN_DEPTH)
    }

    /// Guard sized from a custom depth cap: capacity `4 x max_depth`,
    /// trimmed back to `max_depth` when exceeded.
    #[must_use]
    pub fn with_depth(max_depth: u32) -> Self {
        let keep = max_depth as usize;
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            capacity: keep * 4,
            keep,
        }
    }

    /// Whether the id has been observed.
    #[must_use]
    pub fn contains(&self, update_id: &UpdateId) -> bool {
        self.seen.contains(update_id)
    }

    /// Record an applied update id; trims oldest entries when over capacity.
    ///
    /// Returns `false` if the id was already present (a cycle).
    pub fn insert(&mut self, update_id: UpdateId) -> bool {
        if !self.seen.insert(update_id.clone()) {
            return false;
        }
        self.order.push_back(update_id);

        if self.order.len() > self.capacity {
            let trim = self.order.len() - self.keep;
            for _ in 0..trim {
                if let Some(old) = self.order.pop_front() {
                    self.seen.remove(&old);
                }
            }
            debug!(trimmed = trim, retained = self.keep, "Cycle guard trimmed");
        }
        true
    }

    /// Number of tracked ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the guard is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for CycleGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut guard = CycleGuard::with_depth(10);
        assert!(guard.insert("u1".to_string()));
        assert!(guard.contains(&"u1".to_string()));
        assert!(!guard.contains(&"u2".to_string()));
    }

    #[test]
    fn test_duplicate_insert_detected() {
        let mut guard = CycleGuard::with_depth(10);
        assert!(guard.insert("u1".to_string()));
        assert!(!guard.insert("u1".to_string()));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn test_fifo_trim_to_keep() {
        let mut guard = CycleGuard::with_depth(4); // capacity 16, keep 4

        for i in 0..=16 {
            guard.insert(format!("u{i}"));
        }
        // 17th insert pushed the guard over capacity; only the last 4 remain.
        assert_eq!(guard.len(), 4);
        assert!(!guard.contains(&"u0".to_string()));
        assert!(guard.contains(&"u16".to_string()));
        assert!(guard.contains(&"u13".to_string()));
        assert!(!guard.contains(&"u12".to_string()));
    }

    #[test]
    fn test_trimmed_ids_can_reappear() {
        // Once trimmed, an id is no longer treated as a duplicate. The
        // per-domain head check remains the primary cycle defense.
        let mut guard = CycleGuard::with_depth(2); // capacity 8, keep 2
        for i in 0..9 {
            guard.insert(format!("u{i}"));
        }
        assert!(guard.insert("u0".to_string()));
    }
}
