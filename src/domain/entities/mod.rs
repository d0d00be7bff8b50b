pub mod config;
pub mod package;
pub mod queue_item;

pub use config::AppConfig;
pub use package::{DEFAULT_SOURCE, KNOWN_SOURCES, Package};
pub use queue_item::{QueueAction, QueueItem, QueueItemStatus};
