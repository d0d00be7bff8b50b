pub mod completion_refresher;
pub mod event_bus;
pub mod operation_queue;

pub use completion_refresher::CompletionRefresher;
pub use event_bus::{EventBus, QueueEvent};
pub use operation_queue::OperationQueue;
