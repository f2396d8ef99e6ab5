use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Sender;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::notification::{Notification, QueryFault};
use super::query::Query;

/// State shared by an engine and its workers.
///
/// The queue, the stop flag and the live-thread count each sit behind their own
/// lock. The queue lock is never held while a statement runs.
pub(super) struct Shared {
    pub(super) queue: Mutex<VecDeque<Query>>,
    pub(super) work_available: Condvar,
    pub(super) stop: Mutex<bool>,
    pub(super) threads: Mutex<usize>,
    pub(super) message_type: u32,
}

pub(super) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    pub(super) fn new(message_type: u32) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            work_available: Condvar::new(),
            stop: Mutex::new(false),
            threads: Mutex::new(0),
            message_type,
        }
    }

    pub(super) fn stop_requested(&self) -> bool {
        *lock(&self.stop)
    }

    pub(super) fn set_stop(&self, stop: bool) {
        *lock(&self.stop) = stop;
    }

    /// Wake every idle worker. The queue lock is taken so a worker that has just
    /// checked the stop flag is already parked on the condvar when this fires.
    pub(super) fn wake_all(&self) {
        let _queue = lock(&self.queue);
        self.work_available.notify_all();
    }

    /// Block until there is work, or return `None` once a stop is requested.
    ///
    /// The stop flag wins over pending work: queued items are left in place.
    fn next_query(&self) -> Option<Query> {
        let mut queue = lock(&self.queue);
        loop {
            if self.stop_requested() {
                return None;
            }
            if let Some(query) = queue.pop_front() {
                return Some(query);
            }
            queue = self
                .work_available
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

pub(super) fn run_sql_worker(worker: usize, shared: &Shared, ready: Sender<usize>) {
    *lock(&shared.threads) += 1;
    // start() may already have given up on us after a spawn failure elsewhere.
    let _ = ready.send(worker);
    drop(ready);
    tracing::debug!(worker, "SQL worker idle");

    while let Some(query) = shared.next_query() {
        execute_query(worker, shared.message_type, query);
    }

    *lock(&shared.threads) -= 1;
    tracing::debug!(worker, "SQL worker stopped");
}

fn execute_query(worker: usize, message_type: u32, query: Query) {
    let Query {
        id,
        statement,
        args,
        callback,
    } = query;
    tracing::debug!(worker, query_id = id, "executing queued statement");

    let outcome =
        match panic::catch_unwind(AssertUnwindSafe(|| args.execute_with(statement.as_ref()))) {
            Ok(Ok(())) => {
                tracing::debug!(worker, query_id = id, "queued statement finished");
                Ok(())
            }
            Ok(Err(err)) => {
                tracing::warn!(worker, query_id = id, error = %err, "queued statement failed");
                Err(QueryFault::from(err))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(worker, query_id = id, %message, "queued statement panicked");
                Err(QueryFault::new(format!("statement panicked: {message}")))
            }
        };
    drop(args);

    let notification = Notification::new(message_type, id, outcome);
    if panic::catch_unwind(AssertUnwindSafe(|| callback(notification))).is_err() {
        tracing::error!(worker, query_id = id, "completion callback panicked");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let boxed: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }

    #[test]
    fn stop_wins_over_pending_work() {
        let shared = Shared::new(1);
        shared.set_stop(true);
        assert!(shared.next_query().is_none());
    }
}
