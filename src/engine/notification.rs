use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SqlDispatchError;

/// Failure of a queued query, as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFault {
    message: String,
}

impl QueryFault {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for QueryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for QueryFault {}

impl From<SqlDispatchError> for QueryFault {
    fn from(err: SqlDispatchError) -> Self {
        Self::new(err.to_string())
    }
}

/// Completion message for a queued query.
///
/// `message_type` is the engine's configured discriminator, letting a host that
/// multiplexes several subsystems over one callback path recognise SQL replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    message_type: u32,
    query_id: u64,
    outcome: Result<(), QueryFault>,
}

impl Notification {
    #[must_use]
    pub fn new(message_type: u32, query_id: u64, outcome: Result<(), QueryFault>) -> Self {
        Self {
            message_type,
            query_id,
            outcome,
        }
    }

    #[must_use]
    pub fn message_type(&self) -> u32 {
        self.message_type
    }

    /// Submission id returned by `queue`.
    #[must_use]
    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn outcome(&self) -> Result<(), &QueryFault> {
        self.outcome.as_ref().map(|_| ())
    }

    /// Empty on success, otherwise the UTF-8 fault text.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        match &self.outcome {
            Ok(()) => &[],
            Err(fault) => fault.message.as_bytes(),
        }
    }

    /// # Errors
    /// Returns the fault of a failed query.
    pub fn into_result(self) -> Result<(), QueryFault> {
        self.outcome
    }
}
