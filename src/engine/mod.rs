//! Worker-thread pool that executes queued statements in submission order.

mod notification;
mod query;
mod worker;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tokio::sync::oneshot;

use crate::config::EngineOptions;
use crate::error::SqlDispatchError;
use crate::statement::{QueryArgs, Statement};

pub use notification::{Notification, QueryFault};

use query::{Callback, Query};
use worker::{Shared, lock, run_sql_worker};

/// Bounded pool of OS threads draining a FIFO queue of statement executions.
///
/// [`start`](ConnectionEngine::start) spawns `max_threads` workers and returns once
/// every one of them is waiting for work. [`queue`](ConnectionEngine::queue)
/// appends to the queue and wakes one worker. Each worker runs one query at a
/// time and reports through the query's callback before taking the next.
///
/// [`terminate`](ConnectionEngine::terminate) lets in-flight queries finish, then
/// discards queries that have not started; their callbacks are dropped unrun.
/// The engine can be started again afterwards. Dropping a running engine
/// terminates it.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use sql_dispatch::prelude::*;
///
/// # fn demo(statement: Arc<dyn Statement>) -> Result<(), SqlDispatchError> {
/// let engine = ConnectionEngine::new(EngineOptions::new(4))?;
/// engine.start()?;
/// engine.queue(statement, QueryArgs::new(), |notification| {
///     if let Err(fault) = notification.outcome() {
///         eprintln!("query failed: {fault}");
///     }
/// });
/// engine.terminate();
/// # Ok(())
/// # }
/// ```
pub struct ConnectionEngine {
    options: EngineOptions,
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for ConnectionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEngine")
            .field("options", &self.options)
            .field("live_threads", &self.live_threads())
            .field("queued", &self.queued())
            .finish()
    }
}

impl ConnectionEngine {
    /// Build a stopped engine.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError::ConfigError`] when the options are invalid.
    pub fn new(options: EngineOptions) -> Result<Self, SqlDispatchError> {
        options.validate()?;
        Ok(Self {
            shared: Arc::new(Shared::new(options.message_type)),
            options,
            workers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Spawn the worker pool and wait until every worker is idle.
    ///
    /// Queries queued while the engine was stopped start running immediately.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError::LifecycleError`] if the engine is already
    /// running or a worker thread cannot be spawned; in the latter case the
    /// workers that did start are stopped again.
    pub fn start(&self) -> Result<(), SqlDispatchError> {
        let mut workers = lock(&self.workers);
        if !workers.is_empty() {
            return Err(SqlDispatchError::LifecycleError(
                "connection engine already started".into(),
            ));
        }
        self.shared.set_stop(false);

        let (ready_tx, ready_rx) = mpsc::channel::<usize>();
        let mut spawn_error = None;
        for worker in 0..self.options.max_threads {
            let shared = Arc::clone(&self.shared);
            let ready = ready_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{worker}", self.options.thread_name))
                .spawn(move || run_sql_worker(worker, &shared, ready));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    spawn_error = Some(err);
                    break;
                }
            }
        }
        drop(ready_tx);

        let mut ready = 0;
        while ready < workers.len() && ready_rx.recv().is_ok() {
            ready += 1;
        }

        if let Some(err) = spawn_error {
            self.stop_workers(&mut workers);
            return Err(SqlDispatchError::LifecycleError(format!(
                "failed to spawn SQL worker thread: {err}"
            )));
        }
        if ready < workers.len() {
            self.stop_workers(&mut workers);
            return Err(SqlDispatchError::LifecycleError(
                "SQL worker exited before becoming ready".into(),
            ));
        }

        tracing::info!(
            threads = workers.len(),
            message_type = self.options.message_type,
            "SQL connection engine started"
        );
        Ok(())
    }

    /// Stop the pool and wait for every worker to exit.
    ///
    /// Queries already executing run to completion and report as usual. Queries
    /// still queued are discarded without running; their callbacks never fire.
    /// Returns the number discarded. Calling this on a stopped engine does nothing
    /// and returns zero.
    ///
    /// When called on a worker thread (e.g. the last engine handle dropped inside
    /// a callback) that worker is not waited for; it exits after the callback
    /// returns.
    pub fn terminate(&self) -> usize {
        let abandoned = {
            let mut workers = lock(&self.workers);
            if workers.is_empty() {
                return 0;
            }
            self.stop_workers(&mut workers);
            std::mem::take(&mut *lock(&self.shared.queue))
        };
        // Callback captures may call back into the engine when dropped.
        let count = abandoned.len();
        drop(abandoned);
        if count > 0 {
            tracing::warn!(abandoned = count, "SQL connection engine discarded queued queries");
        }
        tracing::info!("SQL connection engine terminated");
        count
    }

    fn stop_workers(&self, workers: &mut Vec<JoinHandle<()>>) {
        self.shared.set_stop(true);
        self.shared.wake_all();
        let current = thread::current().id();
        for handle in workers.drain(..) {
            // Terminated from one of our own callbacks: that worker sees the
            // stop flag once the callback returns and exits by itself.
            if handle.thread().id() == current {
                tracing::debug!("SQL engine terminated from its own worker, detaching it");
                continue;
            }
            if handle.join().is_err() {
                tracing::error!("SQL worker thread panicked outside a query");
            }
        }
    }

    /// Submit a statement execution and return its submission id.
    ///
    /// Never blocks beyond the queue lock. Queries run in submission order; with a
    /// single worker their callbacks also fire in that order.
    pub fn queue(
        &self,
        statement: Arc<dyn Statement>,
        args: QueryArgs,
        callback: impl FnOnce(Notification) + Send + 'static,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: Callback = Box::new(callback);
        let depth = {
            let mut queue = lock(&self.shared.queue);
            queue.push_back(Query {
                id,
                statement,
                args,
                callback,
            });
            queue.len()
        };
        self.shared.work_available.notify_one();
        tracing::debug!(query_id = id, depth, "queued statement");
        id
    }

    /// Submit a statement execution and get a future for its notification.
    ///
    /// The query is queued before this returns. The future fails with
    /// [`SqlDispatchError::LifecycleError`] if the engine discards the query.
    pub fn queue_async(
        &self,
        statement: Arc<dyn Statement>,
        args: QueryArgs,
    ) -> impl Future<Output = Result<Notification, SqlDispatchError>> + Send + use<> {
        let (tx, rx) = oneshot::channel();
        self.queue(statement, args, move |notification| {
            let _ = tx.send(notification);
        });
        async move {
            rx.await.map_err(|_| {
                SqlDispatchError::LifecycleError("query discarded before execution".into())
            })
        }
    }

    /// Workers currently alive.
    #[must_use]
    pub fn live_threads(&self) -> usize {
        *lock(&self.shared.threads)
    }

    /// Queries waiting for a worker.
    #[must_use]
    pub fn queued(&self) -> usize {
        lock(&self.shared.queue).len()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !lock(&self.workers).is_empty()
    }

    /// Whether a terminate is in progress or has completed.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.shared.stop_requested()
    }
}

impl Drop for ConnectionEngine {
    fn drop(&mut self) {
        self.terminate();
    }
}
