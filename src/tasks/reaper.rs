//! Reap Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! The task runs on the caller's Tokio runtime only when that runtime has
//! worker threads of its own. Otherwise it gets a dedicated thread driving a
//! single-threaded runtime, so a caller blocking its own thread never stalls
//! the sweep.

use std::thread;
use std::time::Duration;

use tokio::runtime::{self, Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::{lock_store, SharedStore, MIN_INTERVAL};

/// Name of the thread hosting a dedicated reap loop.
pub const REAPER_THREAD_NAME: &str = "pokecache-reaper";

// == Start Reaper ==
/// Starts sweeping `store` once per interval.
///
/// A multi-thread runtime in the current context hosts the task. With a
/// current-thread runtime, or no runtime at all, the loop runs on its own
/// thread.
pub fn start_reaper(store: SharedStore) -> ReapHandle {
    match Handle::try_current() {
        Ok(runtime) if !matches!(runtime.runtime_flavor(), RuntimeFlavor::CurrentThread) => {
            start_reaper_on(&runtime, store)
        }
        _ => start_dedicated(store),
    }
}

// == Start Reaper On ==
/// Starts sweeping `store` as a task on `runtime`.
///
/// The caller is responsible for keeping that runtime driven; a blocked
/// current-thread runtime also blocks the sweep.
pub fn start_reaper_on(runtime: &Handle, store: SharedStore) -> ReapHandle {
    let token = CancellationToken::new();
    let task = runtime.spawn(reap_loop(store, token.clone()));
    ReapHandle::new(token, ReapTask::Spawned(task))
}

fn start_dedicated(store: SharedStore) -> ReapHandle {
    let token = CancellationToken::new();
    let loop_token = token.clone();
    let (done_tx, done_rx) = oneshot::channel();

    let spawned = thread::Builder::new()
        .name(REAPER_THREAD_NAME.to_string())
        .spawn(move || {
            let runtime = match runtime::Builder::new_current_thread().enable_time().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(error = %err, "Failed to build cache reap runtime");
                    return;
                }
            };
            runtime.block_on(reap_loop(store, loop_token));
            let _ = done_tx.send(());
        });

    let task = match spawned {
        Ok(thread) => ReapTask::Dedicated {
            thread,
            done: done_rx,
        },
        Err(err) => {
            error!(error = %err, "Failed to spawn cache reap thread, entries will not expire");
            ReapTask::Failed
        }
    };

    ReapHandle::new(token, task)
}

// == Reap Loop ==
/// Sweeps `store` once per interval until `token` is cancelled.
///
/// The sweep period is the store's expiry interval; the two are not
/// configurable separately. The first sweep runs one interval after the
/// loop starts. Each pass holds the store lock for its full length.
pub async fn reap_loop(store: SharedStore, token: CancellationToken) {
    let period = lock_store(&store).interval().max(MIN_INTERVAL);
    info!(
        interval_ms = period.as_millis() as u64,
        "Starting cache reap task"
    );

    let start = Instant::now();
    let mut deadline = next_deadline(start, period, start);

    loop {
        let Some(due) = deadline else {
            // No representable deadline, so no entry can ever become stale
            info!("Cache interval exceeds the clock range, sweeps disabled");
            token.cancelled().await;
            info!("Cache reap task cancelled");
            return;
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Cache reap task cancelled");
                return;
            }
            _ = time::sleep_until(due) => {}
        }

        let (removed, remaining) = {
            let mut guard = lock_store(&store);
            let removed = guard.reap(Instant::now());
            (removed, guard.len())
        };

        if removed > 0 {
            info!(removed, remaining, "Cache reap: removed expired entries");
        } else {
            debug!(remaining, "Cache reap: no expired entries found");
        }

        deadline = next_deadline(due, period, Instant::now());
    }
}

/// Next sweep instant after `previous`, skipping ahead if sweeps fell behind.
///
/// Returns `None` when the result does not fit the clock.
fn next_deadline(previous: Instant, period: Duration, now: Instant) -> Option<Instant> {
    let next = previous.checked_add(period)?;
    if next < now {
        now.checked_add(period)
    } else {
        Some(next)
    }
}

// == Reap Task ==
/// Where a reap loop is running.
#[derive(Debug)]
enum ReapTask {
    /// Task on a caller-provided runtime
    Spawned(JoinHandle<()>),
    /// Loop on its own thread; `done` fires when the loop returns normally
    Dedicated {
        thread: thread::JoinHandle<()>,
        done: oneshot::Receiver<()>,
    },
    /// Nothing could be started
    Failed,
}

// == Reap Handle ==
/// Owner of a running reap loop.
///
/// Dropping the handle cancels the loop without waiting for it. Use
/// [`ReapHandle::shutdown`] to cancel and wait for it to exit, or
/// [`ReapHandle::detach`] to let it run for the life of the process.
#[derive(Debug)]
pub struct ReapHandle {
    token: CancellationToken,
    task: ReapTask,
    detached: bool,
}

impl ReapHandle {
    fn new(token: CancellationToken, task: ReapTask) -> Self {
        Self {
            token,
            task,
            detached: false,
        }
    }

    // == Cancel ==
    /// Signals the loop to stop without waiting.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    // == Is Cancelled ==
    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    // == Is Finished ==
    /// Returns true once the loop has exited.
    pub fn is_finished(&self) -> bool {
        match &self.task {
            ReapTask::Spawned(task) => task.is_finished(),
            ReapTask::Dedicated { thread, .. } => thread.is_finished(),
            ReapTask::Failed => true,
        }
    }

    // == Is Dedicated ==
    /// Returns true if the loop runs on its own thread.
    pub fn is_dedicated(&self) -> bool {
        matches!(self.task, ReapTask::Dedicated { .. })
    }

    // == Detach ==
    /// Releases the handle without stopping the loop.
    pub fn detach(mut self) {
        self.detached = true;
    }

    // == Shutdown ==
    /// Cancels the loop and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        match std::mem::replace(&mut self.task, ReapTask::Failed) {
            ReapTask::Spawned(task) => {
                if let Err(err) = task.await {
                    warn!(error = %err, "Cache reap task ended abnormally");
                }
            }
            ReapTask::Dedicated { done, .. } => {
                if done.await.is_err() {
                    warn!("Cache reap thread ended abnormally");
                }
            }
            ReapTask::Failed => {}
        }
    }
}

impl Drop for ReapHandle {
    fn drop(&mut self) {
        if !self.detached {
            self.token.cancel();
        }
    }
}
