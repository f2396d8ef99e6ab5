//! In-memory statements for exercising the engine without a database.
//!
//! [`MemoryStatement`] drives the generic conversion hooks exactly like a real
//! driver would, against a [`MemoryTable`] of [`RowValues`] rows. [`Gate`] lets a
//! test hold a worker inside `execute` until it chooses to release it.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::conversion::{ValueConversion, bind_params, fetch_row, load_row, row_values};
use crate::data::{Set, SetContainerPar};
use crate::error::SqlDispatchError;
use crate::statement::Statement;
use crate::types::RowValues;

/// Rows shared between statements, like a single database table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    rows: Arc<Mutex<Vec<Vec<RowValues>>>>,
}

impl MemoryTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<RowValues>> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn push(&self, row: Vec<RowValues>) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }
}

/// Blocks callers of [`wait`](Gate::wait) until [`open`](Gate::open) is called.
#[derive(Debug, Default)]
pub struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    waiting: usize,
}

impl Gate {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.open = true;
        self.changed.notify_all();
    }

    pub fn wait(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.waiting += 1;
        self.changed.notify_all();
        while !state.open {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until `count` callers have reached [`wait`](Gate::wait).
    pub fn wait_for_waiters(&self, count: usize) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while state.waiting < count {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[derive(Debug)]
enum Behaviour {
    Insert(MemoryTable),
    Select(MemoryTable),
    Fail(String),
    Panic(String),
    Gated(Arc<Gate>),
}

/// A statement executed against memory instead of a database.
#[derive(Debug)]
pub struct MemoryStatement {
    behaviour: Behaviour,
}

impl MemoryStatement {
    /// Append the parameter record to `table`. Reports the 1-based row number as
    /// insert id and one affected row.
    #[must_use]
    pub fn insert(table: &MemoryTable) -> Self {
        Self {
            behaviour: Behaviour::Insert(table.clone()),
        }
    }

    /// Copy every row of `table` whose leading columns equal the parameter
    /// record into the result container. Without parameters every row matches.
    #[must_use]
    pub fn select(table: &MemoryTable) -> Self {
        Self {
            behaviour: Behaviour::Select(table.clone()),
        }
    }

    /// Fail every execution with an execution error carrying `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            behaviour: Behaviour::Fail(message.into()),
        }
    }

    /// Panic on every execution.
    #[must_use]
    pub fn panicking(message: impl Into<String>) -> Self {
        Self {
            behaviour: Behaviour::Panic(message.into()),
        }
    }

    /// Succeed once `gate` opens.
    #[must_use]
    pub fn gated(gate: &Arc<Gate>) -> Self {
        Self {
            behaviour: Behaviour::Gated(Arc::clone(gate)),
        }
    }
}

fn encode(parameters: &dyn Set) -> Result<Vec<RowValues>, SqlDispatchError> {
    let mut hooks = ValueConversion::for_set(parameters);
    bind_params(parameters, &mut hooks)?;
    Ok(row_values(&hooks))
}

fn select_into(
    stored: &[Vec<RowValues>],
    filter: &[RowValues],
    results: &mut dyn SetContainerPar,
) -> Result<u64, SqlDispatchError> {
    let mut matched = 0;
    for row in stored.iter().filter(|row| row.starts_with(filter)) {
        let record = results.append();
        let mut hooks = ValueConversion::for_set(record);
        let filled = load_row(&mut hooks, row.clone()).and_then(|()| fetch_row(record, &mut hooks));
        if let Err(err) = filled {
            results.remove_last();
            return Err(err);
        }
        matched += 1;
    }
    Ok(matched)
}

impl Statement for MemoryStatement {
    fn execute(
        &self,
        parameters: Option<&dyn Set>,
        results: Option<&mut dyn SetContainerPar>,
        insert_id: Option<&mut u64>,
        rows: Option<&mut u64>,
    ) -> Result<(), SqlDispatchError> {
        match &self.behaviour {
            Behaviour::Insert(table) => {
                let parameters = parameters.ok_or_else(|| {
                    SqlDispatchError::BindingError("insert requires parameters".into())
                })?;
                let row = encode(parameters)?;
                let mut stored = table.rows.lock().unwrap_or_else(PoisonError::into_inner);
                stored.push(row);
                if let Some(id) = insert_id {
                    *id = stored.len() as u64;
                }
                if let Some(rows) = rows {
                    *rows = 1;
                }
                Ok(())
            }
            Behaviour::Select(table) => {
                let filter = parameters.map(encode).transpose()?.unwrap_or_default();
                let stored = table.rows();
                let matched = match results {
                    Some(results) => select_into(&stored, &filter, results)?,
                    None => stored.iter().filter(|r| r.starts_with(&filter)).count() as u64,
                };
                if let Some(rows) = rows {
                    *rows = matched;
                }
                Ok(())
            }
            Behaviour::Fail(message) => Err(SqlDispatchError::ExecutionError(message.clone())),
            Behaviour::Panic(message) => panic!("{message}"),
            Behaviour::Gated(gate) => {
                gate.wait();
                Ok(())
            }
        }
    }
}
