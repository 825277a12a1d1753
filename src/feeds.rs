use std::sync::Arc;

use tokio::sync::watch;

use crate::db::models::{Personnel, Reading};

/// Current snapshot of one collection, shared with any number of subscribers.
///
/// Snapshots are immutable `Arc<Vec<T>>`s: publishing swaps the whole
/// collection, so a subscriber never observes a half-applied update.
/// Cloning the handle shares the same channel.
pub struct Feed<T> {
    tx: Arc<watch::Sender<Arc<Vec<T>>>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tx: Arc::new(tx) }
    }
}

impl<T> Feed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot and wake every subscriber.
    pub fn publish(&self, items: Vec<T>) {
        self.tx.send_replace(Arc::new(items));
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<T>>> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.tx.borrow())
    }
}

/// The two independently updated collections the status view is built from.
///
/// There is no transaction across the two: a subscriber may briefly see new
/// readings with old personnel, or the reverse.
#[derive(Clone, Default)]
pub struct Feeds {
    pub readings: Feed<Reading>,
    pub personnel: Feed<Personnel>,
}

impl Feeds {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_feed_is_empty() {
        let feed: Feed<u32> = Feed::new();
        assert!(feed.snapshot().is_empty());
    }

    #[test]
    fn publish_replaces_snapshot() {
        let feed = Feed::new();
        feed.publish(vec![1, 2, 3]);
        feed.publish(vec![4]);
        assert_eq!(*feed.snapshot(), vec![4]);
    }

    #[test]
    fn publish_without_subscribers_still_updates() {
        let feed = Feed::new();
        feed.publish(vec!["a"]);
        assert_eq!(feed.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn subscriber_is_notified() {
        let feed = Feed::new();
        let mut rx = feed.subscribe();

        feed.publish(vec![7]);

        rx.changed().await.unwrap();
        assert_eq!(**rx.borrow_and_update(), vec![7]);
    }

    #[test]
    fn clone_shares_state() {
        let feed = Feed::new();
        let clone = feed.clone();

        feed.publish(vec![42]);

        assert_eq!(*clone.snapshot(), vec![42]);
    }

    #[test]
    fn feeds_are_independent() {
        let feeds = Feeds::new();
        feeds.personnel.publish(Vec::new());
        assert!(feeds.readings.snapshot().is_empty());
        assert!(feeds.personnel.snapshot().is_empty());
    }
}
