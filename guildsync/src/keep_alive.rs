//! Keep-alive-after-response seam
//!
//! Background syncs are handed to a [`KeepAlive`] instead of being awaited in
//! the request path. The host guarantees the task runs to completion even
//! though the response has already been sent.

use futures::future::BoxFuture;
use tokio_util::task::TaskTracker;

/// A detached unit of work
pub type BackgroundTask = BoxFuture<'static, ()>;

/// Host primitive keeping work alive after the response is returned
pub trait KeepAlive: Send + Sync {
    fn register(&self, task: BackgroundTask);
}

/// Tokio implementation: tasks are spawned on a [`TaskTracker`] that the
/// binary closes and drains during graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct TaskTrackerKeepAlive {
    tracker: TaskTracker,
}

impl TaskTrackerKeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting work and wait for in-flight tasks to settle
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl KeepAlive for TaskTrackerKeepAlive {
    fn register(&self, task: BackgroundTask) {
        self.tracker.spawn(task);
    }
}
