use clap::Args;
use serde::{Deserialize, Serialize};

use crate::engine::ConnectionEngine;
use crate::error::SqlDispatchError;

/// Discriminator stamped on notifications when none is configured.
pub const DEFAULT_MESSAGE_TYPE: u32 = 1;

/// Options for a [`ConnectionEngine`].
///
/// Deserializable (missing keys take their defaults) and usable as a flattened
/// `clap` argument group in host binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct EngineOptions {
    /// Worker threads executing queued statements
    #[arg(long = "sql-threads", default_value_t = 1)]
    pub max_threads: usize,
    /// Discriminator stamped on every completion notification
    #[arg(long = "sql-message-type", default_value_t = DEFAULT_MESSAGE_TYPE)]
    pub message_type: u32,
    /// Prefix for worker thread names
    #[arg(long = "sql-thread-name", default_value = "sql-worker")]
    pub thread_name: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_threads: 1,
            message_type: DEFAULT_MESSAGE_TYPE,
            thread_name: "sql-worker".into(),
        }
    }
}

impl EngineOptions {
    #[must_use]
    pub fn new(max_threads: usize) -> Self {
        Self {
            max_threads,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::new()
    }

    /// Parse options from JSON, e.g. a section of an application config file.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError::ConfigError`] for malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self, SqlDispatchError> {
        let opts: EngineOptions = serde_json::from_str(json)?;
        opts.validate()?;
        Ok(opts)
    }

    /// # Errors
    /// Returns [`SqlDispatchError::ConfigError`] when `max_threads` is zero or the
    /// thread name is blank.
    pub fn validate(&self) -> Result<(), SqlDispatchError> {
        if self.max_threads == 0 {
            return Err(SqlDispatchError::ConfigError(
                "max_threads must be at least 1".into(),
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(SqlDispatchError::ConfigError(
                "thread_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`EngineOptions`].
#[derive(Debug, Clone, Default)]
pub struct EngineOptionsBuilder {
    opts: EngineOptions,
}

impl EngineOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.opts.max_threads = max_threads;
        self
    }

    #[must_use]
    pub fn message_type(mut self, message_type: u32) -> Self {
        self.opts.message_type = message_type;
        self
    }

    #[must_use]
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.opts.thread_name = thread_name.into();
        self
    }

    #[must_use]
    pub fn finish(self) -> EngineOptions {
        self.opts
    }

    /// Build a stopped [`ConnectionEngine`].
    ///
    /// # Errors
    /// Returns [`SqlDispatchError::ConfigError`] when the options are invalid.
    pub fn build(self) -> Result<ConnectionEngine, SqlDispatchError> {
        ConnectionEngine::new(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        engine: EngineOptions,
    }

    #[test]
    fn json_fills_missing_keys_with_defaults() {
        let opts = EngineOptions::from_json(r#"{ "max_threads": 8 }"#).unwrap();
        assert_eq!(opts.max_threads, 8);
        assert_eq!(opts.message_type, DEFAULT_MESSAGE_TYPE);
        assert_eq!(opts.thread_name, "sql-worker");
    }

    #[test]
    fn zero_threads_is_rejected() {
        let err = EngineOptions::from_json(r#"{ "max_threads": 0 }"#).unwrap_err();
        assert!(matches!(err, SqlDispatchError::ConfigError(_)));
        assert!(EngineOptions::builder().max_threads(0).build().is_err());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = EngineOptions::from_json("{ max_threads: ").unwrap_err();
        assert!(matches!(err, SqlDispatchError::ConfigError(_)));
    }

    #[test]
    fn flattens_into_a_cli() {
        let cli = Cli::parse_from(["app", "--sql-threads", "3", "--sql-message-type", "7"]);
        assert_eq!(cli.engine.max_threads, 3);
        assert_eq!(cli.engine.message_type, 7);
        assert_eq!(cli.engine.thread_name, "sql-worker");
    }

    #[test]
    fn builder_sets_every_field() {
        let opts = EngineOptions::builder()
            .max_threads(2)
            .message_type(9)
            .thread_name("db")
            .finish();
        assert_eq!(
            opts,
            EngineOptions {
                max_threads: 2,
                message_type: 9,
                thread_name: "db".into(),
            }
        );
    }
}
