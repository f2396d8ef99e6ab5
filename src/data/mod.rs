//! Generic record binding: nullable storage, record descriptors and result containers.

mod container;
mod macros;
mod nullable;
mod set;

pub use container::{SetContainer, SetContainerPar, SharedContainer};
pub use nullable::{Nullable, NullableArray, NullablePar};
pub use set::{FieldMut, FieldRef, Set, SharedSet, field_at, field_at_mut, validate_set};

use crate::types::{
    Bigint, Bit, Blob, Date, Datetime, Double, Float, Int, Short, Text, Time, Tiny, Ubigint,
    Uint, Ushort, Utiny, Wtext,
};

pub type UtinyN = Nullable<Utiny>;
pub type TinyN = Nullable<Tiny>;
pub type UshortN = Nullable<Ushort>;
pub type ShortN = Nullable<Short>;
pub type UintN = Nullable<Uint>;
pub type IntN = Nullable<Int>;
pub type UbigintN = Nullable<Ubigint>;
pub type BigintN = Nullable<Bigint>;
pub type FloatN = Nullable<Float>;
pub type DoubleN = Nullable<Double>;
pub type TimeN = Nullable<Time>;
pub type DateN = Nullable<Date>;
pub type DatetimeN = Nullable<Datetime>;
pub type BlobN = Nullable<Blob>;
pub type TextN = Nullable<Text>;
pub type WtextN = Nullable<Wtext>;
pub type BitN = Nullable<Bit>;
