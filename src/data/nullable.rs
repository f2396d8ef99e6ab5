use std::any::Any;
use std::fmt;

/// Object-safe view of any [`Nullable`], independent of the wrapped type.
///
/// Generic marshaling code uses this to flip the null flag and reach the wrapped
/// storage without knowing `T` up front.
pub trait NullablePar {
    fn is_null(&self) -> bool;
    fn set_null(&mut self, null: bool);
    /// The wrapped storage, valid whether or not the value is null.
    fn storage_any(&self) -> &dyn Any;
    fn storage_any_mut(&mut self) -> &mut dyn Any;
}

/// A value with an SQL null flag.
///
/// While [`is_null`](Nullable::is_null) is true the wrapped value is unspecified:
/// [`get`](Nullable::get) hides it, but [`storage_mut`](Nullable::storage_mut)
/// still hands out the slot so a driver can fill it in place.
///
/// ```rust
/// use sql_dispatch::data::Nullable;
///
/// let mut n: Nullable<i32> = Nullable::null();
/// assert!(n.is_null());
/// n.set(42);
/// assert_eq!(n.get(), Some(&42));
/// assert_eq!(n.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nullable<T> {
    value: T,
    null: bool,
}

/// Fixed-length nullable storage, e.g. a `CHAR(16)` column.
pub type NullableArray<T, const N: usize> = Nullable<[T; N]>;

impl<T: Default> Nullable<T> {
    /// A null value backed by `T::default()` storage.
    #[must_use]
    pub fn null() -> Self {
        Self {
            value: T::default(),
            null: true,
        }
    }

    /// Mark null and reset the storage to `T::default()`.
    pub fn clear(&mut self) {
        self.value = T::default();
        self.null = true;
    }
}

impl<T> Nullable<T> {
    /// A non-null value.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self { value, null: false }
    }

    /// A null value backed by caller-supplied storage, for types without `Default`.
    #[must_use]
    pub fn null_with(storage: T) -> Self {
        Self {
            value: storage,
            null: true,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.null
    }

    pub fn set_null(&mut self, null: bool) {
        self.null = null;
    }

    /// The value, or `None` when null.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        if self.null { None } else { Some(&self.value) }
    }

    /// Store a value and clear the null flag.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.null = false;
    }

    /// Raw storage regardless of the null flag.
    #[must_use]
    pub fn storage(&self) -> &T {
        &self.value
    }

    /// Mutable raw storage regardless of the null flag.
    pub fn storage_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Storage and null flag together, for conversion hooks that fill both.
    pub fn parts_mut(&mut self) -> (&mut T, &mut bool) {
        (&mut self.value, &mut self.null)
    }

    #[must_use]
    pub fn into_option(self) -> Option<T> {
        if self.null { None } else { Some(self.value) }
    }
}

impl<T: Default> Default for Nullable<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<T> for Nullable<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::new(v),
            None => Self::null(),
        }
    }
}

impl<T: 'static> NullablePar for Nullable<T> {
    fn is_null(&self) -> bool {
        self.null
    }

    fn set_null(&mut self, null: bool) {
        self.null = null;
    }

    fn storage_any(&self) -> &dyn Any {
        &self.value
    }

    fn storage_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }
}

impl<T: fmt::Display> fmt::Display for Nullable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.null {
            f.write_str("NULL")
        } else {
            self.value.fmt(f)
        }
    }
}
