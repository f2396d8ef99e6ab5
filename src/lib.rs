//! Driver-agnostic SQL record binding and queued statement execution.
//!
//! Application records describe their fields positionally through the
//! [`Set`](data::Set) trait, usually via [`sql_set!`]. A driver implements
//! [`Statement`](statement::Statement) and translates fields with
//! [`Conversion`](conversion::Conversion) hooks. Statements run either directly
//! on the calling thread or through a [`ConnectionEngine`](engine::ConnectionEngine),
//! whose worker pool executes queued queries in order and reports each outcome
//! as a [`Notification`](engine::Notification).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sql_dispatch::prelude::*;
//! use sql_dispatch::data::TextN;
//!
//! #[derive(Default)]
//! struct User {
//!     id: i64,
//!     name: TextN,
//! }
//!
//! sql_set!(User { id: Bigint, name: TextN });
//!
//! # fn run(select_users: Arc<dyn Statement>) -> Result<(), SqlDispatchError> {
//! let engine = EngineOptions::builder().max_threads(2).build()?;
//! engine.start()?;
//!
//! let users = SetContainer::<User>::new().shared();
//! engine.queue(
//!     select_users,
//!     QueryArgs::new().with_results(users.clone()),
//!     |notification| println!("done: {}", notification.is_success()),
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conversion;
pub mod data;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod statement;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod types;

pub use error::SqlDispatchError;
