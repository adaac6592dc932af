//! Tracks spawned dispatch continuations so shutdown can drain or abandon them.
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Outcome of [`TaskManager::drain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Tasks that finished before the deadline (including panicked ones).
    pub completed: usize,
    /// Tasks still running at the deadline, which were aborted.
    pub abandoned: usize,
}

/// A centralized owner for spawned tasks.
///
/// Finished handles are pruned on every spawn, so the list only holds work
/// that may still be in flight.
#[derive(Clone, Debug, Default)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<(String, JoinHandle<()>)>>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, Vec<(String, JoinHandle<()>)>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns a new task on the current runtime and adds its handle to the
    /// manager. Fails when called outside a Tokio runtime.
    pub fn spawn<F>(&self, name: impl Into<String>, future: F) -> Result<(), TryCurrentError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current()?;
        let name = name.into();
        debug!(task_name = %name, "Spawning task");
        let handle = runtime.spawn(future);
        let mut handles = self.handles();
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((name, handle));
        Ok(())
    }

    /// The number of tracked tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.handles().iter().filter(|(_, h)| !h.is_finished()).count()
    }

    /// Waits up to `timeout` for every tracked task, then aborts the rest.
    pub async fn drain(&self, timeout: Duration) -> DrainReport {
        let handles: Vec<_> = self.handles().drain(..).collect();
        if handles.is_empty() {
            return DrainReport::default();
        }
        info!(
            "TaskManager draining. Waiting up to {:?} for {} tasks...",
            timeout,
            handles.len()
        );

        let total = handles.len();
        let names: Vec<String> = handles.iter().map(|(name, _)| name.clone()).collect();
        let aborts: Vec<_> = handles.iter().map(|(_, h)| h.abort_handle()).collect();
        let joined = join_all(handles.into_iter().map(|(_, handle)| handle));

        match tokio::time::timeout(timeout, joined).await {
            Ok(results) => {
                for (name, result) in names.iter().zip(results) {
                    if let Err(e) = result {
                        error!(task_name = %name, error = %e, "Task failed during drain.");
                    }
                }
                info!("All {} tasks drained.", total);
                DrainReport {
                    completed: total,
                    abandoned: 0,
                }
            }
            Err(_) => {
                let mut abandoned = 0;
                for (name, abort) in names.iter().zip(&aborts) {
                    if !abort.is_finished() {
                        warn!(task_name = %name, "Abandoning task still running at drain deadline.");
                        abort.abort();
                        abandoned += 1;
                    }
                }
                DrainReport {
                    completed: total - abandoned,
                    abandoned,
                }
            }
        }
    }

    /// Aborts every tracked task without waiting. Returns how many were running.
    pub fn abort_all(&self) -> usize {
        let handles: Vec<_> = self.handles().drain(..).collect();
        let mut aborted = 0;
        for (name, handle) in handles {
            if !handle.is_finished() {
                debug!(task_name = %name, "Aborting task");
                handle.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            warn!("Abandoned {} in-flight tasks.", aborted);
        }
        aborted
    }
}
