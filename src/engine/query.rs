use std::sync::Arc;

use crate::statement::{QueryArgs, Statement};

use super::Notification;

pub(crate) type Callback = Box<dyn FnOnce(Notification) + Send + 'static>;

/// One queued execution: the statement, its shared data and where to report.
pub(crate) struct Query {
    pub(crate) id: u64,
    pub(crate) statement: Arc<dyn Statement>,
    pub(crate) args: QueryArgs,
    pub(crate) callback: Callback,
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("id", &self.id)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
