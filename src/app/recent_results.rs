// SPDX-License-Identifier: GPL-3.0-only

//! Bounded newest-first list of rendered decodes

use crate::app::frame_processor::DecodeResult;
use crate::constants::RECENT_RESULTS_CAPACITY;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RecentResults {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for RecentResults {
    fn default() -> Self {
        Self::new(RECENT_RESULTS_CAPACITY)
    }
}

impl RecentResults {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a decode; the oldest entry is evicted once full
    pub fn push(&mut self, result: &DecodeResult) {
        self.push_rendered(result.render());
    }

    pub fn push_rendered(&mut self, entry: String) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first
    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_with_eviction() {
        let mut recent = RecentResults::default();
        for i in 0..13 {
            recent.push_rendered(format!("code-{}", i));
        }

        assert_eq!(recent.len(), 10);
        let entries = recent.to_vec();
        assert_eq!(entries.first().map(String::as_str), Some("code-12"));
        assert_eq!(entries.last().map(String::as_str), Some("code-3"));
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut recent = RecentResults::new(0);
        recent.push_rendered("x".into());
        assert!(recent.is_empty());
    }
}
