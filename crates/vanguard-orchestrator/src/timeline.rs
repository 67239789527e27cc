//! Bounded timeline ring.
//!
//! Stores the most recent [`TimelineEvent`]s in submission order. Once the
//! configured capacity is reached the oldest entry is evicted; entries are
//! never edited after append.

use std::collections::VecDeque;

use vanguard_types::TimelineEvent;

/// Default ring capacity.
pub const DEFAULT_TIMELINE_CAP: usize = 1000;

/// Append-only, bounded event ring.
#[derive(Debug)]
pub struct Timeline {
    events: VecDeque<TimelineEvent>,
    cap: usize,
}

impl Timeline {
    pub fn new(cap: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(cap.min(DEFAULT_TIMELINE_CAP)),
            cap: cap.max(1),
        }
    }

    /// Append an event, evicting the oldest entry when full.
    pub fn push(&mut self, event: TimelineEvent) {
        if self.events.len() == self.cap {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The most recent `limit` events, ordered oldest-to-newest.
    pub fn recent(&self, limit: usize) -> Vec<TimelineEvent> {
        let skip = self.events.len().saturating_sub(limit);
        self.events.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_TIMELINE_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vanguard_types::EventKind;

    fn event(n: usize) -> TimelineEvent {
        TimelineEvent::new(EventKind::System, json!({ "n": n }))
    }

    #[test]
    fn ring_never_exceeds_capacity() {
        let mut timeline = Timeline::new(10);
        for n in 0..100 {
            timeline.push(event(n));
            assert!(timeline.len() <= 10);
        }
        assert_eq!(timeline.len(), 10);
    }

    #[test]
    fn eviction_keeps_most_recent_entries() {
        let mut timeline = Timeline::new(5);
        for n in 0..20 {
            timeline.push(event(n));
        }
        let kept: Vec<u64> = timeline
            .recent(5)
            .iter()
            .map(|e| e.data["n"].as_u64().unwrap())
            .collect();
        assert_eq!(kept, vec![15, 16, 17, 18, 19]);
    }

    #[test]
    fn recent_is_ordered_oldest_to_newest() {
        let mut timeline = Timeline::default();
        for n in 0..10 {
            timeline.push(event(n));
        }
        let last3: Vec<u64> = timeline
            .recent(3)
            .iter()
            .map(|e| e.data["n"].as_u64().unwrap())
            .collect();
        assert_eq!(last3, vec![7, 8, 9]);
    }

    #[test]
    fn recent_with_large_limit_returns_everything() {
        let mut timeline = Timeline::default();
        for n in 0..4 {
            timeline.push(event(n));
        }
        assert_eq!(timeline.recent(1000).len(), 4);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut timeline = Timeline::new(0);
        timeline.push(event(1));
        timeline.push(event(2));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.recent(1)[0].data["n"], 2);
    }
}
