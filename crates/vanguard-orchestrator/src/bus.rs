//! Broadcast bus for timeline events.
//!
//! Built on [`tokio::sync::broadcast`] so every subscriber receives every
//! event without any single subscriber blocking the others. Publishing is
//! fire-and-forget: zero subscribers is a normal condition, and a subscriber
//! that falls behind only loses its own oldest events.

use tokio::sync::broadcast;
use vanguard_types::TimelineEvent;

/// Default channel capacity (buffered events per subscriber before the
/// oldest are dropped for that subscriber).
const DEFAULT_CAPACITY: usize = 256;

/// Shared event bus. Clone it cheaply – all clones publish into the same
/// underlying channel.
#[derive(Clone, Debug)]
pub struct TimelineBus {
    sender: broadcast::Sender<TimelineEvent>,
}

impl TimelineBus {
    /// Create a bus with the given per-subscriber capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Returns the number of subscribers the event was handed to. A return
    /// of `0` means nobody is listening, which is not an error: the emitter
    /// must never block or fail because of its observers.
    pub fn publish(&self, event: TimelineEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEvent> {
        self.sender.subscribe()
    }
}

impl Default for TimelineBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
