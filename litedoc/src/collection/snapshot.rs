use crate::errors::{DocError, DocResult, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Runtime and liveness flag shared by the re-fetch tasks of one snapshot
/// subscription.
///
/// Change handlers run synchronously on the publishing thread, so each
/// re-fetch is spawned onto the runtime that was current when the snapshot
/// was registered. Tasks check the flag before invoking the user callback;
/// unsubscribing clears it, so re-fetches already in flight are dropped.
#[derive(Clone)]
pub(crate) struct SnapshotContext {
    runtime: Handle,
    active: Arc<AtomicBool>,
}

impl SnapshotContext {
    /// Captures the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` outside of a tokio runtime.
    pub(crate) fn capture() -> DocResult<Self> {
        match Handle::try_current() {
            Ok(runtime) => Ok(SnapshotContext {
                runtime,
                active: Arc::new(AtomicBool::new(true)),
            }),
            Err(e) => {
                log::error!("Snapshot listeners need a tokio runtime: {}", e);
                Err(DocError::new(
                    "Snapshot listeners can only be registered from within a tokio runtime",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task);
    }

    /// Returns a closure that deactivates the subscription.
    pub(crate) fn teardown(&self) -> impl FnOnce() + Send + 'static {
        let active = self.active.clone();
        move || active.store(false, Ordering::Release)
    }
}
