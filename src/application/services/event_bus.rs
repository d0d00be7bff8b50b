use crate::domain::entities::QueueItem;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

/// Queue notifications, each carrying a snapshot of the affected item.
#[derive(Clone, Debug, PartialEq)]
pub enum QueueEvent {
    ItemAdded(QueueItem),
    ItemStatusChanged(QueueItem),
    /// Only for actions that finished successfully.
    ItemCompleted(QueueItem),
}

impl QueueEvent {
    pub fn item(&self) -> &QueueItem {
        match self {
            QueueEvent::ItemAdded(item)
            | QueueEvent::ItemStatusChanged(item)
            | QueueEvent::ItemCompleted(item) => item,
        }
    }
}

type Listener = Arc<dyn Fn(&QueueEvent) + Send + Sync>;

/// Synchronous fan-out to registered callbacks, on whichever task publishes.
pub struct EventBus {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn publish(&self, event: QueueEvent) {
        // Snapshot so a listener may subscribe without deadlocking.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                tracing::error!(
                    "Queue listener panicked while handling item {}",
                    event.item().id
                );
            }
        }
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
