use thiserror::Error;

/// Boxed error type drivers can forward through [`SqlDispatchError::DriverError`].
pub type BoxedDriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SqlDispatchError {
    #[error(transparent)]
    DriverError(#[from] BoxedDriverError),

    #[error("Binding error: {0}")]
    BindingError(String),

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Lifecycle error: {0}")]
    LifecycleError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for SqlDispatchError {
    fn from(err: serde_json::Error) -> Self {
        SqlDispatchError::ConfigError(format!("invalid engine options: {err}"))
    }
}

impl SqlDispatchError {
    pub(crate) fn index_out_of_range(index: usize, count: usize) -> Self {
        SqlDispatchError::BindingError(format!(
            "field index {index} out of range for record with {count} fields"
        ))
    }
}
