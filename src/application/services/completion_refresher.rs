use crate::application::services::event_bus::QueueEvent;
use crate::application::services::operation_queue::OperationQueue;
use crate::application::use_cases::RefreshCatalogPackage;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

/// Keeps the catalog in step with the machine: whenever a queued action
/// succeeds, the affected package is re-resolved and the catalog saved.
pub struct CompletionRefresher {
    refresh: Arc<RefreshCatalogPackage>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl CompletionRefresher {
    pub fn new(refresh: Arc<RefreshCatalogPackage>) -> Self {
        Self {
            refresh,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn attach(self: &Arc<Self>, queue: &OperationQueue) {
        let this = Arc::clone(self);
        queue.subscribe(move |event| {
            let QueueEvent::ItemCompleted(item) = event else {
                return;
            };
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                tracing::warn!("No runtime available to refresh {}", item.package_id);
                return;
            };

            let refresh = Arc::clone(&this.refresh);
            let package_id = item.package_id.clone();
            let handle = runtime.spawn(async move {
                match refresh.execute(&package_id).await {
                    Ok(true) => tracing::info!("Catalog entry {} refreshed", package_id),
                    Ok(false) => {}
                    Err(e) => tracing::error!("Failed to refresh {}: {:#}", package_id, e),
                }
            });

            let mut pending = this.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        });
    }

    /// Waits for refreshes already started. Completions published afterwards
    /// are not covered.
    pub async fn settle(&self) {
        let handles = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *pending)
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Catalog refresh task failed: {}", e);
            }
        }
    }
}
