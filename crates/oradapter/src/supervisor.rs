//! Supervision boundary for isolated storage tasks.
//!
//! Storage lifecycle work never runs on the application's pool. Each unit of
//! work gets its own named OS thread and its own asupersync current-thread
//! runtime; the thread is detached, and the caller observes it only through a
//! [`TaskHandle`] with a deadline.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use asupersync::runtime::RuntimeBuilder;
use futures::channel::oneshot;
use oradapter_core::Error;
use oradapter_core::error::Result;

/// Name of the process-wide storage supervisor.
pub const STORAGE_SUPERVISOR: &str = "oradapter-storage";

static STORAGE: OnceLock<Arc<Supervisor>> = OnceLock::new();

/// Resolves when the task's caller gives up on it.
pub type CancelSignal = oneshot::Receiver<()>;

/// Spawns and tracks detached one-shot tasks.
#[derive(Debug)]
pub struct Supervisor {
    name: String,
    spawned: AtomicU64,
    live: Arc<AtomicUsize>,
    started: Mutex<HashSet<TypeId>>,
}

impl Supervisor {
    /// Create a new, independent supervision boundary.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spawned: AtomicU64::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            started: Mutex::new(HashSet::new()),
        }
    }

    /// The shared boundary used for storage operations.
    pub fn storage() -> Arc<Supervisor> {
        Arc::clone(STORAGE.get_or_init(|| Arc::new(Supervisor::new(STORAGE_SUPERVISOR))))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tasks that have not finished yet.
    pub fn live_tasks(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Number of tasks ever spawned on this boundary.
    pub fn spawned_tasks(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Run `start` for `key` unless it already succeeded on this boundary.
    ///
    /// Concurrent callers wait for the one doing the work. A failure is not
    /// recorded, so the next caller runs `start` again.
    pub fn start_once(&self, key: TypeId, start: impl FnOnce() -> Result<()>) -> Result<()> {
        let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);
        if started.contains(&key) {
            return Ok(());
        }
        start()?;
        started.insert(key);
        Ok(())
    }

    /// Spawn a detached unit of work.
    ///
    /// `work` receives a [`CancelSignal`] that resolves once the caller stops
    /// waiting; the future it returns should race its work against it.
    /// Panics inside the task are caught and reported as errors.
    pub fn spawn<F, Fut, T>(&self, work: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce(CancelSignal) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>>,
        T: Send + 'static,
    {
        let id = self.spawned.fetch_add(1, Ordering::Relaxed) + 1;
        let (result_tx, result_rx) = mpsc::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let live = LiveGuard::enter(Arc::clone(&self.live));
        let thread_name = format!("{}-{}", self.name, id);

        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let _live = live;
                let panic_tx = result_tx.clone();
                let ran = panic::catch_unwind(AssertUnwindSafe(move || -> Result<()> {
                    let rt = RuntimeBuilder::current_thread().build().map_err(|e| {
                        Error::Custom(format!("failed to start task runtime: {e:?}"))
                    })?;
                    rt.block_on(async move {
                        let result = work(cancel_rx).await;
                        // The caller may already have timed out.
                        let _ = result_tx.send(result);
                    });
                    Ok(())
                }));
                match ran {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        let _ = panic_tx.send(Err(e));
                    }
                    Err(payload) => {
                        tracing::error!(task = id, "isolated task panicked");
                        let _ = panic_tx.send(Err(panic_error(payload.as_ref())));
                    }
                }
            })?;

        tracing::trace!(task = id, thread = %thread_name, "spawned isolated task");

        Ok(TaskHandle {
            id,
            result: result_rx,
            cancel: Some(cancel_tx),
        })
    }
}

/// The caller's view of one spawned task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    id: u64,
    result: mpsc::Receiver<Result<T>>,
    cancel: Option<oneshot::Sender<()>>,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Block until the task reports or `deadline` elapses.
    ///
    /// On expiry the task is cancelled and `Error::Timeout` is returned.
    pub fn wait(mut self, deadline: Duration) -> Result<T> {
        match self.result.recv_timeout(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    task = self.id,
                    deadline_ms = deadline.as_millis() as u64,
                    "isolated task exceeded its deadline; cancelling"
                );
                self.cancel();
                Err(Error::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::Custom(format!(
                "isolated task {} exited without reporting a result",
                self.id
            ))),
        }
    }

    /// Signal the task to stop. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

/// Keeps a boundary's live count accurate however the task exits.
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::AcqRel);
        Self(live)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn panic_error(payload: &(dyn Any + Send)) -> Error {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    Error::Custom(format!("isolated task crashed: {detail}"))
}
