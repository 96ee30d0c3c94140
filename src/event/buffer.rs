use crate::event::Event;
use std::collections::VecDeque;

/// Chronological event buffer
///
/// Events are kept sorted by timestamp; equal timestamps keep arrival order. A bounded
/// buffer evicts its oldest entry when full.
#[derive(Debug, Clone, Default)]
pub struct EventBuffer {
    events: VecDeque<Event>,
    capacity: Option<usize>,
}

impl EventBuffer {
    /// Create a buffer holding at most `capacity` events
    pub fn bounded(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Insert in timestamp order; returns the evicted event, if any
    pub fn push(&mut self, event: Event) -> Option<Event> {
        let at = self.events.partition_point(|e| e.timestamp() <= event.timestamp());
        self.events.insert(at, event);

        match self.capacity {
            Some(capacity) if self.events.len() > capacity => self.events.pop_front(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn first_timestamp(&self) -> Option<u64> {
        self.events.front().map(Event::timestamp)
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.events.back().map(Event::timestamp)
    }

    /// Ordered copy of the buffered events
    pub fn to_vec(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    /// Take every event out, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(ts: u64, url: &str) -> Event {
        Event::navigation(ts, url)
    }

    #[test]
    fn test_orders_by_timestamp() {
        let mut buffer = EventBuffer::unbounded();
        buffer.push(nav(300, "c"));
        buffer.push(nav(100, "a"));
        buffer.push(nav(200, "b"));

        let stamps: Vec<u64> = buffer.iter().map(Event::timestamp).collect();
        assert_eq!(stamps, vec![100, 200, 300]);
        assert_eq!(buffer.first_timestamp(), Some(100));
        assert_eq!(buffer.last_timestamp(), Some(300));
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let mut buffer = EventBuffer::unbounded();
        buffer.push(nav(100, "first"));
        buffer.push(nav(100, "second"));
        buffer.push(nav(50, "earlier"));

        let urls: Vec<&str> = buffer.iter().filter_map(Event::page_url).collect();
        assert_eq!(urls, vec!["earlier", "first", "second"]);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let mut buffer = EventBuffer::bounded(2);
        assert!(buffer.push(nav(1, "a")).is_none());
        assert!(buffer.push(nav(2, "b")).is_none());
        let evicted = buffer.push(nav(3, "c")).unwrap();
        assert_eq!(evicted.timestamp(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_drain_empties() {
        let mut buffer = EventBuffer::unbounded();
        buffer.push(nav(1, "a"));
        let events = buffer.drain();
        assert_eq!(events.len(), 1);
        assert!(buffer.is_empty());
    }
}
