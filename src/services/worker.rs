//! # Background worker owned by a service.
//!
//! Holds the join handle and cancellation token of one spawned loop. `spawn` is
//! called from `Service::start`, `shutdown` from `Service::stop`.
//!
//! ## Rules
//! - at most one loop per worker; a stopped worker cannot be restarted
//! - `shutdown` cancels, then joins; calling it again is a no-op

use std::future::Future;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;

/// Handle to the background loop of a service.
pub struct Worker {
    name: &'static str,
    cancel: CancellationToken,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Creates an idle worker.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cancel: CancellationToken::new(),
            join: Mutex::new(None),
        }
    }

    /// Spawns the loop built by `f` on the current tokio runtime.
    ///
    /// `f` receives a child token cancelled by [`Worker::shutdown`].
    pub fn spawn<F, Fut>(&self, f: F) -> Result<(), ServiceError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let rt = Handle::try_current().map_err(|_| ServiceError::NoRuntime)?;

        let mut join = self.join.lock();
        if join.is_some() {
            return Err(ServiceError::AlreadyStarted);
        }
        if self.cancel.is_cancelled() {
            return Err(ServiceError::start(format!("{} worker already stopped", self.name)));
        }
        *join = Some(rt.spawn(f(self.cancel.child_token())));
        Ok(())
    }

    /// Cancels the loop and waits for it to exit.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.cancel.cancel();
        let join = self.join.lock().take();
        match join {
            Some(handle) => handle
                .await
                .map_err(|e| ServiceError::stop(format!("{} worker: {e}", self.name))),
            None => Ok(()),
        }
    }

    /// True while a loop is spawned and not yet shut down.
    pub fn is_running(&self) -> bool {
        self.join.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}
