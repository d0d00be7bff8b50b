use crate::application::services::event_bus::{EventBus, QueueEvent};
use crate::domain::cancellation::CancellationToken;
use crate::domain::entities::{QueueAction, QueueItem, QueueItemStatus};
use crate::domain::errors::ActionError;
use crate::domain::repositories::PackageRepository;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

struct QueueEntry {
    item: QueueItem,
    /// Present only while the item is running.
    cancel: Option<CancellationToken>,
}

/// Items plus the events their transitions produced, under one lock so the
/// outbox order is the transition order.
#[derive(Default)]
struct QueueList {
    entries: Vec<QueueEntry>,
    outbox: VecDeque<QueueEvent>,
}

struct QueueState {
    list: Mutex<QueueList>,
    /// Held by whichever caller is delivering the outbox.
    dispatching: Mutex<()>,
    /// Single slot held for the whole execute phase of an item.
    execute_slot: tokio::sync::Mutex<()>,
    wake: Notify,
    changed: Notify,
    events: EventBus,
    actions: Arc<dyn PackageRepository>,
}

/// Sequential queue of package actions.
///
/// A worker task owned by the queue drains it: items run one at a time in
/// arrival order, and a failed item never stops the ones behind it. History is
/// kept for the life of the queue.
///
/// Listeners see each item's events in transition order. A listener may call
/// back into the queue; events it causes are delivered after it returns.
pub struct OperationQueue {
    state: Arc<QueueState>,
    worker: JoinHandle<()>,
}

impl OperationQueue {
    /// Must be called from within a tokio runtime.
    pub fn new(actions: Arc<dyn PackageRepository>) -> Self {
        let state = Arc::new(QueueState {
            list: Mutex::new(QueueList::default()),
            dispatching: Mutex::new(()),
            execute_slot: tokio::sync::Mutex::new(()),
            wake: Notify::new(),
            changed: Notify::new(),
            events: EventBus::new(),
            actions,
        });

        let worker_state = Arc::clone(&state);
        let worker = tokio::spawn(async move {
            tracing::debug!("Operation queue worker started");
            loop {
                worker_state.drain().await;
                worker_state.wake.notified().await;
            }
        });

        Self { state, worker }
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&QueueEvent) + Send + Sync + 'static,
    {
        self.state.events.subscribe(listener);
    }

    /// Appends `item` as Pending and wakes the worker. Returns the id to use
    /// with [`cancel`](Self::cancel).
    pub fn enqueue(&self, mut item: QueueItem) -> u64 {
        item.status = QueueItemStatus::Pending;
        item.progress = 0.0;

        {
            let mut list = self.state.list();
            if list.entries.iter().any(|e| e.item.id == item.id) {
                let fresh = QueueItem::new(item.package_id.clone(), item.action).id;
                tracing::warn!("Queue item {} enqueued twice, re-numbered as {}", item.id, fresh);
                item.id = fresh;
            }
            list.entries.push(QueueEntry {
                item: item.clone(),
                cancel: None,
            });
            list.outbox.push_back(QueueEvent::ItemAdded(item.clone()));
        }

        tracing::info!("Enqueued {} of {} as item {}", item.action, item.package_id, item.id);
        self.state.wake.notify_one();
        self.state.flush();
        item.id
    }

    /// Cancels a pending or running item. Returns `false` for unknown or
    /// already finished items.
    pub fn cancel(&self, item_id: u64) -> bool {
        let canceled = {
            let mut list = self.state.list();
            let QueueList { entries, outbox } = &mut *list;
            let Some(entry) = entries.iter_mut().find(|e| e.item.id == item_id) else {
                return false;
            };

            match entry.item.status {
                QueueItemStatus::Pending => {}
                QueueItemStatus::Running => {
                    if let Some(token) = &entry.cancel {
                        token.cancel();
                    }
                }
                _ => return false,
            }
            entry.item.status = QueueItemStatus::Canceled;
            entry.item.append_log("Canceled by user");
            outbox.push_back(QueueEvent::ItemStatusChanged(entry.item.clone()));
            entry.item.clone()
        };

        tracing::info!("Canceled {} of {}", canceled.action, canceled.package_id);
        self.state.flush();
        true
    }

    /// Snapshot of every item in arrival order, finished ones included.
    pub fn get_queue(&self) -> Vec<QueueItem> {
        self.state.list().entries.iter().map(|e| e.item.clone()).collect()
    }

    pub fn get_item(&self, item_id: u64) -> Option<QueueItem> {
        self.state.find(item_id)
    }

    /// Processes pending items until none are left. The worker does this on its
    /// own; calling it directly just waits for the current backlog.
    pub async fn drain(&self) {
        self.state.drain().await;
    }

    /// Waits until the item reaches a terminal status. `None` if it is unknown.
    pub async fn wait_for(&self, item_id: u64) -> Option<QueueItem> {
        loop {
            let changed = self.state.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            match self.state.find(item_id) {
                None => return None,
                Some(item) if item.status.is_terminal() => return Some(item),
                Some(_) => {}
            }
            changed.await;
        }
    }
}

impl Drop for OperationQueue {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

impl QueueState {
    fn list(&self) -> MutexGuard<'_, QueueList> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find(&self, item_id: u64) -> Option<QueueItem> {
        self.list()
            .entries
            .iter()
            .find(|e| e.item.id == item_id)
            .map(|e| e.item.clone())
    }

    /// Delivers queued events unless another caller is already doing so, in
    /// which case that caller picks ours up too.
    fn flush(&self) {
        self.changed.notify_waiters();
        loop {
            {
                let _dispatch = match self.dispatching.try_lock() {
                    Ok(guard) => guard,
                    Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                    Err(TryLockError::WouldBlock) => return,
                };
                loop {
                    let next = self.list().outbox.pop_front();
                    let Some(event) = next else {
                        break;
                    };
                    self.events.publish(event);
                }
            }
            // An event queued between the last pop and the unlock would
            // otherwise wait for the next transition.
            if self.list().outbox.is_empty() {
                return;
            }
        }
    }

    async fn drain(&self) {
        loop {
            let _slot = self.execute_slot.lock().await;

            let Some((item, cancel)) = self.start_next() else {
                return;
            };
            self.flush();
            tracing::info!("Starting action {} on {}", item.action, item.package_id);

            let result = self.execute(&item, cancel).await;
            self.finish(item.id, result);
        }
    }

    /// Moves the oldest pending item to Running and hands it a fresh token.
    fn start_next(&self) -> Option<(QueueItem, CancellationToken)> {
        let mut list = self.list();
        let QueueList { entries, outbox } = &mut *list;
        let entry = entries
            .iter_mut()
            .find(|e| e.item.status == QueueItemStatus::Pending)?;

        let token = CancellationToken::new();
        entry.item.status = QueueItemStatus::Running;
        entry.item.progress = 0.0;
        entry.cancel = Some(token.clone());
        outbox.push_back(QueueEvent::ItemStatusChanged(entry.item.clone()));
        Some((entry.item.clone(), token))
    }

    /// Runs the action on its own task so a panicking implementation fails the
    /// item instead of the worker.
    async fn execute(
        &self,
        item: &QueueItem,
        cancel: CancellationToken,
    ) -> Result<(), ActionError> {
        let actions = Arc::clone(&self.actions);
        let package_id = item.package_id.clone();
        let action = item.action;

        let task = tokio::spawn(async move {
            match action {
                QueueAction::Install => actions.install_package(&package_id, &cancel).await,
                QueueAction::Uninstall => actions.uninstall_package(&package_id, &cancel).await,
                QueueAction::Upgrade => actions.upgrade_package(&package_id, &cancel).await,
            }
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(ActionError::Aborted(e.to_string())),
        }
    }

    fn finish(&self, item_id: u64, result: Result<(), ActionError>) {
        let finished = {
            let mut list = self.list();
            let QueueList { entries, outbox } = &mut *list;
            let Some(entry) = entries.iter_mut().find(|e| e.item.id == item_id) else {
                return;
            };
            entry.cancel = None;

            // Canceled while running: the cancel call already recorded it, and
            // whatever the action returned afterwards is ignored.
            if entry.item.status != QueueItemStatus::Running {
                None
            } else {
                let item = &mut entry.item;
                match result {
                    Ok(()) => {
                        item.status = QueueItemStatus::Completed;
                        item.progress = 100.0;
                    }
                    Err(e) if e.is_canceled() => {
                        item.status = QueueItemStatus::Canceled;
                    }
                    Err(e) => {
                        let line = format!("{} of {} failed: {}", item.action, item.package_id, e);
                        item.status = QueueItemStatus::Failed;
                        item.append_log(line);
                    }
                }
                outbox.push_back(QueueEvent::ItemStatusChanged(item.clone()));
                if item.status == QueueItemStatus::Completed {
                    outbox.push_back(QueueEvent::ItemCompleted(item.clone()));
                }
                Some(item.clone())
            }
        };

        match finished {
            Some(item) if item.status == QueueItemStatus::Completed => {
                tracing::info!("{} of {} completed", item.action, item.package_id);
            }
            Some(item) if item.status == QueueItemStatus::Failed => {
                tracing::error!(
                    "Action failed for {}: {}",
                    item.package_id,
                    item.log.last().map(String::as_str).unwrap_or_default()
                );
            }
            Some(item) => {
                tracing::info!("{} of {} was canceled", item.action, item.package_id);
            }
            None => {}
        }
        self.flush();
    }
}
