//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{EngineOptions, EngineOptionsBuilder};
pub use crate::conversion::{Conversion, Conversions, ValueConversion, bind_params, fetch_row};
pub use crate::data::{
    FieldMut, FieldRef, Nullable, NullableArray, NullablePar, Set, SetContainer, SetContainerPar,
    SharedContainer, SharedSet, validate_set,
};
pub use crate::engine::{ConnectionEngine, Notification, QueryFault};
pub use crate::error::SqlDispatchError;
pub use crate::sql_set;
pub use crate::statement::{QueryArgs, SharedCount, Statement, StatementHandle, shared_count};
pub use crate::types::{RowValues, Type};
