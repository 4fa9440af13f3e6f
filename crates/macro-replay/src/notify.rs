//! Typed notification channels.
//!
//! Recorder and player state changes are published through a [`Notifier`]
//! instead of callbacks. Every subscriber receives every notification in
//! the order it was emitted. Delivery happens on whatever task emitted it,
//! and receivers may be drained from any task.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A publish interface for notifications of type `T`.
#[derive(Debug)]
pub struct Notifier<T> {
    subscribers: Mutex<Vec<UnboundedSender<T>>>,
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Notifier<T> {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to future notifications.
    ///
    /// Notifications emitted before this call are not replayed.
    #[must_use]
    pub fn subscribe(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Deliver a notification to every live subscriber.
    ///
    /// Subscribers whose receiver was dropped are removed. Never blocks.
    pub fn emit(&self, notification: T) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(notification.clone()).is_ok());
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}
