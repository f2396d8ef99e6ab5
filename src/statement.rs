//! The statement contract drivers implement, and the data bundle handed to it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};

use crate::data::{Set, SetContainerPar, SharedContainer, SharedSet};
use crate::engine::{ConnectionEngine, Notification};
use crate::error::SqlDispatchError;

/// Integer output slot (row count or insert id) shared with a worker thread.
pub type SharedCount = Arc<AtomicU64>;

/// A fresh integer output slot holding zero.
#[must_use]
pub fn shared_count() -> SharedCount {
    Arc::new(AtomicU64::new(0))
}

/// A prepared SQL statement supplied by a driver.
///
/// The statement owns its per-field [`Conversion`](crate::conversion::Conversion)
/// hooks and runs them around the driver call. One instance may be executed from
/// several worker threads at once; implementations that keep per-call state must
/// synchronize it themselves.
pub trait Statement: Send + Sync {
    /// Run the statement on the calling thread.
    ///
    /// `parameters` is the bound input record, if the statement takes any.
    /// Result rows are appended to `results`. `insert_id` receives the last
    /// auto-increment value and `rows` the affected/matching row count, when the
    /// caller asked for them.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] for any driver or conversion failure.
    fn execute(
        &self,
        parameters: Option<&dyn Set>,
        results: Option<&mut dyn SetContainerPar>,
        insert_id: Option<&mut u64>,
        rows: Option<&mut u64>,
    ) -> Result<(), SqlDispatchError>;
}

/// Shared inputs and outputs of one queued execution.
///
/// `None` in any slot means the statement does not use it, which is distinct from
/// a handle to an empty record or a zero counter.
#[derive(Clone, Default)]
pub struct QueryArgs {
    pub parameters: Option<SharedSet>,
    pub results: Option<SharedContainer>,
    pub insert_id: Option<SharedCount>,
    pub rows: Option<SharedCount>,
}

impl std::fmt::Debug for QueryArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryArgs")
            .field("parameters", &self.parameters.is_some())
            .field("results", &self.results.is_some())
            .field("insert_id", &self.insert_id)
            .field("rows", &self.rows)
            .finish()
    }
}

impl QueryArgs {
    /// No parameters, no results, no counters.
    pub const EMPTY: QueryArgs = QueryArgs {
        parameters: None,
        results: None,
        insert_id: None,
        rows: None,
    };

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: SharedSet) -> Self {
        self.parameters = Some(parameters);
        self
    }

    #[must_use]
    pub fn with_results(mut self, results: SharedContainer) -> Self {
        self.results = Some(results);
        self
    }

    #[must_use]
    pub fn with_insert_id(mut self, insert_id: SharedCount) -> Self {
        self.insert_id = Some(insert_id);
        self
    }

    #[must_use]
    pub fn with_rows(mut self, rows: SharedCount) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Execute `statement` against these handles on the calling thread.
    ///
    /// The result container stays locked for the duration of the call. Counter
    /// values the driver wrote are published even when it fails.
    ///
    /// # Errors
    /// Returns whatever [`Statement::execute`] returns.
    pub fn execute_with<S: Statement + ?Sized>(
        &self,
        statement: &S,
    ) -> Result<(), SqlDispatchError> {
        let mut results = self
            .results
            .as_ref()
            .map(|r| r.lock().unwrap_or_else(PoisonError::into_inner));
        let mut insert_id = self.insert_id.as_ref().map(|c| c.load(Ordering::Acquire));
        let mut rows = self.rows.as_ref().map(|c| c.load(Ordering::Acquire));

        let outcome = statement.execute(
            self.parameters.as_deref().map(|p| p as &dyn Set),
            results
                .as_deref_mut()
                .map(|r| r as &mut dyn SetContainerPar),
            insert_id.as_mut(),
            rows.as_mut(),
        );

        if let (Some(slot), Some(value)) = (&self.insert_id, insert_id) {
            slot.store(value, Ordering::Release);
        }
        if let (Some(slot), Some(value)) = (&self.rows, rows) {
            slot.store(value, Ordering::Release);
        }
        outcome
    }
}

/// A statement paired with the engine that runs its queued executions.
pub struct StatementHandle<S> {
    statement: Arc<S>,
    engine: Arc<ConnectionEngine>,
}

impl<S> Clone for StatementHandle<S> {
    fn clone(&self) -> Self {
        Self {
            statement: Arc::clone(&self.statement),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S: Statement + 'static> StatementHandle<S> {
    #[must_use]
    pub fn new(statement: Arc<S>, engine: Arc<ConnectionEngine>) -> Self {
        Self { statement, engine }
    }

    #[must_use]
    pub fn statement(&self) -> &Arc<S> {
        &self.statement
    }

    /// Synchronous execution on the calling thread.
    ///
    /// # Errors
    /// Returns the driver's error.
    pub fn execute(
        &self,
        parameters: Option<&dyn Set>,
        results: Option<&mut dyn SetContainerPar>,
        insert_id: Option<&mut u64>,
        rows: Option<&mut u64>,
    ) -> Result<(), SqlDispatchError> {
        self.statement.execute(parameters, results, insert_id, rows)
    }

    /// Queue for execution on the engine's worker pool and return immediately.
    ///
    /// `callback` runs exactly once on a worker thread with the outcome, unless
    /// the engine is terminated before the query starts. Returns the submission id.
    pub fn queue(
        &self,
        args: QueryArgs,
        callback: impl FnOnce(Notification) + Send + 'static,
    ) -> u64 {
        self.engine
            .queue(Arc::clone(&self.statement) as Arc<dyn Statement>, args, callback)
    }

    /// Queue for execution and await the notification.
    ///
    /// The query is submitted before this returns, not on first poll.
    pub fn queue_async(
        &self,
        args: QueryArgs,
    ) -> impl Future<Output = Result<Notification, SqlDispatchError>> + Send + use<S> {
        self.engine
            .queue_async(Arc::clone(&self.statement) as Arc<dyn Statement>, args)
    }
}
