use std::sync::Arc;

use crate::data::Nullable;
use crate::error::SqlDispatchError;
use crate::types::{
    Bigint, Bit, Blob, Date, Datetime, Double, Float, Int, Short, Text, Time, Tiny, Type,
    Ubigint, Uint, Ushort, Utiny, Wtext,
};

macro_rules! field_views {
    ($( $base:ident / $null:ident : $ty:ty ),* $(,)?) => {
        /// Read-only view of one record field, tagged with its kind.
        #[derive(Debug, Clone, Copy)]
        pub enum FieldRef<'a> {
            $(
                $base(&'a $ty),
                $null(&'a Nullable<$ty>),
            )*
            Char(&'a [u8]),
            Binary(&'a [u8]),
            /// Fixed-length storage plus its null flag.
            CharN(&'a [u8], bool),
            BinaryN(&'a [u8], bool),
        }

        /// Writable view of one record field, tagged with its kind.
        #[derive(Debug)]
        pub enum FieldMut<'a> {
            $(
                $base(&'a mut $ty),
                $null(&'a mut Nullable<$ty>),
            )*
            Char(&'a mut [u8]),
            Binary(&'a mut [u8]),
            CharN(&'a mut [u8], &'a mut bool),
            BinaryN(&'a mut [u8], &'a mut bool),
        }

        impl FieldRef<'_> {
            /// The kind this view carries.
            #[must_use]
            pub fn sql_type(&self) -> Type {
                match self {
                    $(
                        Self::$base(_) => Type::$base,
                        Self::$null(_) => Type::$null,
                    )*
                    Self::Char(_) => Type::Char,
                    Self::Binary(_) => Type::Binary,
                    Self::CharN(..) => Type::CharN,
                    Self::BinaryN(..) => Type::BinaryN,
                }
            }

            /// Null flag of a nullable field; always `false` for the others.
            #[must_use]
            pub fn is_null(&self) -> bool {
                match self {
                    $( Self::$null(n) => n.is_null(), )*
                    Self::CharN(_, null) | Self::BinaryN(_, null) => *null,
                    _ => false,
                }
            }
        }

        impl FieldMut<'_> {
            #[must_use]
            pub fn sql_type(&self) -> Type {
                self.as_field_ref().sql_type()
            }

            /// Reborrow as a read-only view.
            #[must_use]
            pub fn as_field_ref(&self) -> FieldRef<'_> {
                match self {
                    $(
                        Self::$base(v) => FieldRef::$base(&**v),
                        Self::$null(n) => FieldRef::$null(&**n),
                    )*
                    Self::Char(b) => FieldRef::Char(&**b),
                    Self::Binary(b) => FieldRef::Binary(&**b),
                    Self::CharN(b, null) => FieldRef::CharN(&**b, **null),
                    Self::BinaryN(b, null) => FieldRef::BinaryN(&**b, **null),
                }
            }

            /// Set the null flag. Returns `false` when the field is not nullable.
            pub fn set_null(&mut self, null: bool) -> bool {
                match self {
                    $( Self::$null(n) => { n.set_null(null); true } )*
                    Self::CharN(_, flag) | Self::BinaryN(_, flag) => {
                        **flag = null;
                        true
                    }
                    _ => false,
                }
            }
        }
    };
}

field_views! {
    Utiny / UtinyN: Utiny,
    Ushort / UshortN: Ushort,
    Uint / UintN: Uint,
    Ubigint / UbigintN: Ubigint,
    Tiny / TinyN: Tiny,
    Short / ShortN: Short,
    Int / IntN: Int,
    Bigint / BigintN: Bigint,
    Float / FloatN: Float,
    Double / DoubleN: Double,
    Time / TimeN: Time,
    Date / DateN: Date,
    Datetime / DatetimeN: Datetime,
    Blob / BlobN: Blob,
    Text / TextN: Text,
    Wtext / WtextN: Wtext,
    Bit / BitN: Bit,
}

impl FieldRef<'_> {
    /// Byte length of a fixed char/binary field.
    #[must_use]
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            Self::Char(b) | Self::Binary(b) | Self::CharN(b, _) | Self::BinaryN(b, _) => {
                Some(b.len())
            }
            _ => None,
        }
    }
}

/// A record whose fields bind positionally to SQL parameters or result columns.
///
/// Field `i` is the `i`-th `?` of the statement (or its `i`-th result column).
/// Implementations must keep [`type_of`](Set::type_of) and the variant returned by
/// [`field`](Set::field) in agreement for every index; [`validate_set`] checks
/// this. Most records implement the trait with [`sql_set!`](crate::sql_set).
///
/// ```rust
/// use sql_dispatch::data::{DoubleN, FieldRef, Set};
/// use sql_dispatch::types::{Text, Type};
///
/// #[derive(Default)]
/// struct Price {
///     name: Text,
///     amount: DoubleN,
/// }
///
/// sql_dispatch::sql_set!(Price { name: Text, amount: DoubleN });
///
/// let p = Price::default();
/// assert_eq!(p.count(), 2);
/// assert_eq!(p.type_of(1), Type::DoubleN);
/// assert!(matches!(p.field(0), Some(FieldRef::Text(_))));
/// assert_eq!(p.type_of(2), Type::Nothing);
/// ```
pub trait Set {
    /// Number of bindable fields. Constant for a concrete type.
    fn count(&self) -> usize;

    /// Kind of field `index`, or [`Type::Nothing`] past the end.
    fn type_of(&self, index: usize) -> Type;

    /// Byte size of a fixed char/binary field. Zero for every other kind.
    fn size_of(&self, index: usize) -> usize {
        let _ = index;
        0
    }

    fn field(&self, index: usize) -> Option<FieldRef<'_>>;

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

/// Parameter record shared between a caller and a worker thread.
pub type SharedSet = Arc<dyn Set + Send + Sync>;

/// Fetch a field view, turning a bad index into a binding error.
///
/// # Errors
/// Returns [`SqlDispatchError::BindingError`] when `index >= set.count()`.
pub fn field_at(set: &dyn Set, index: usize) -> Result<FieldRef<'_>, SqlDispatchError> {
    let count = set.count();
    if index >= count {
        return Err(SqlDispatchError::index_out_of_range(index, count));
    }
    set.field(index)
        .ok_or_else(|| SqlDispatchError::index_out_of_range(index, count))
}

/// Mutable counterpart of [`field_at`].
///
/// # Errors
/// Returns [`SqlDispatchError::BindingError`] when `index >= set.count()`.
pub fn field_at_mut(set: &mut dyn Set, index: usize) -> Result<FieldMut<'_>, SqlDispatchError> {
    let count = set.count();
    if index >= count {
        return Err(SqlDispatchError::index_out_of_range(index, count));
    }
    set.field_mut(index)
        .ok_or_else(|| SqlDispatchError::index_out_of_range(index, count))
}

/// Check that a record's declared tags, sizes and field views agree.
///
/// Every index below `count()` must yield a view whose kind equals `type_of`;
/// fixed char/binary fields must report a non-zero `size_of` equal to their byte
/// length, and all other kinds must report zero. The index just past the end must
/// report [`Type::Nothing`] and no view.
///
/// # Errors
/// Returns [`SqlDispatchError::BindingError`] describing the first inconsistency.
pub fn validate_set(set: &dyn Set) -> Result<(), SqlDispatchError> {
    let count = set.count();
    for index in 0..count {
        let declared = set.type_of(index);
        if declared == Type::Nothing {
            return Err(SqlDispatchError::BindingError(format!(
                "field {index} declares no type"
            )));
        }
        let view = set.field(index).ok_or_else(|| {
            SqlDispatchError::BindingError(format!("field {index} has no storage"))
        })?;
        if view.sql_type() != declared {
            return Err(SqlDispatchError::BindingError(format!(
                "field {index} declares {declared:?} but stores {:?}",
                view.sql_type()
            )));
        }
        let size = set.size_of(index);
        match view.fixed_len() {
            Some(len) if size == 0 || size != len => {
                return Err(SqlDispatchError::BindingError(format!(
                    "field {index} ({declared:?}) reports size {size} for {len} bytes of storage"
                )));
            }
            None if size != 0 => {
                return Err(SqlDispatchError::BindingError(format!(
                    "field {index} ({declared:?}) is not fixed-length but reports size {size}"
                )));
            }
            _ => {}
        }
    }
    if set.type_of(count) != Type::Nothing || set.field(count).is_some() {
        return Err(SqlDispatchError::BindingError(format!(
            "record exposes a field past its count of {count}"
        )));
    }
    Ok(())
}
