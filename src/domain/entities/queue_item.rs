use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueAction {
    Install,
    Uninstall,
    Upgrade,
}

impl fmt::Display for QueueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueAction::Install => write!(f, "Install"),
            QueueAction::Uninstall => write!(f, "Uninstall"),
            QueueAction::Upgrade => write!(f, "Upgrade"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueItemStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl QueueItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueueItemStatus::Completed | QueueItemStatus::Failed | QueueItemStatus::Canceled
        )
    }
}

impl fmt::Display for QueueItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueItemStatus::Pending => write!(f, "Pending"),
            QueueItemStatus::Running => write!(f, "Running"),
            QueueItemStatus::Completed => write!(f, "Completed"),
            QueueItemStatus::Failed => write!(f, "Failed"),
            QueueItemStatus::Canceled => write!(f, "Canceled"),
        }
    }
}

/// One requested mutation of a package.
///
/// Items handed out by the queue are snapshots; mutating one has no effect on the
/// queue. Use [`QueueItem::id`] to refer back to the queued item.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub id: u64,
    pub package_id: String,
    pub action: QueueAction,
    pub status: QueueItemStatus,
    pub progress: f64,
    pub log: Vec<String>,
}

impl QueueItem {
    pub fn new(package_id: impl Into<String>, action: QueueAction) -> Self {
        Self {
            id: NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed),
            package_id: package_id.into(),
            action,
            status: QueueItemStatus::Pending,
            progress: 0.0,
            log: Vec::new(),
        }
    }

    pub fn install(package_id: impl Into<String>) -> Self {
        Self::new(package_id, QueueAction::Install)
    }

    pub fn uninstall(package_id: impl Into<String>) -> Self {
        Self::new(package_id, QueueAction::Uninstall)
    }

    pub fn upgrade(package_id: impl Into<String>) -> Self {
        Self::new(package_id, QueueAction::Upgrade)
    }

    pub fn append_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_items_get_distinct_ids() {
        let a = QueueItem::install("A.A");
        let b = QueueItem::install("A.A");

        assert_ne!(a.id, b.id);
        assert_eq!(a.status, QueueItemStatus::Pending);
        assert_eq!(a.progress, 0.0);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!QueueItemStatus::Pending.is_terminal());
        assert!(!QueueItemStatus::Running.is_terminal());
        assert!(QueueItemStatus::Completed.is_terminal());
        assert!(QueueItemStatus::Failed.is_terminal());
        assert!(QueueItemStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(QueueAction::Upgrade.to_string(), "Upgrade");
        assert_eq!(QueueItemStatus::Canceled.to_string(), "Canceled");
    }
}
