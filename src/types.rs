use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::SqlDispatchError;

/// Semantic kind of a bindable field.
///
/// Every kind has a nullable twin (suffix `N`) whose storage is wrapped in
/// [`Nullable`](crate::data::Nullable). `Nothing` is what a record reports for an
/// index it does not have.
///
/// The discriminants are stable: the nullable twin of a kind is always the base
/// discriminant plus [`Type::NULLABLE_OFFSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Type {
    Utiny = 0,
    Ushort,
    Uint,
    Ubigint,
    Tiny,
    Short,
    Int,
    Bigint,
    Float,
    Double,
    Time,
    Date,
    Datetime,
    Blob,
    Text,
    Wtext,
    Char,
    Binary,
    Bit,
    UtinyN,
    UshortN,
    UintN,
    UbigintN,
    TinyN,
    ShortN,
    IntN,
    BigintN,
    FloatN,
    DoubleN,
    TimeN,
    DateN,
    DatetimeN,
    BlobN,
    TextN,
    WtextN,
    CharN,
    BinaryN,
    BitN,
    Nothing,
}

impl Type {
    /// Distance between a base kind and its nullable twin.
    pub const NULLABLE_OFFSET: u8 = 19;

    /// All tags in discriminant order.
    pub const ALL: [Type; 39] = [
        Type::Utiny,
        Type::Ushort,
        Type::Uint,
        Type::Ubigint,
        Type::Tiny,
        Type::Short,
        Type::Int,
        Type::Bigint,
        Type::Float,
        Type::Double,
        Type::Time,
        Type::Date,
        Type::Datetime,
        Type::Blob,
        Type::Text,
        Type::Wtext,
        Type::Char,
        Type::Binary,
        Type::Bit,
        Type::UtinyN,
        Type::UshortN,
        Type::UintN,
        Type::UbigintN,
        Type::TinyN,
        Type::ShortN,
        Type::IntN,
        Type::BigintN,
        Type::FloatN,
        Type::DoubleN,
        Type::TimeN,
        Type::DateN,
        Type::DatetimeN,
        Type::BlobN,
        Type::TextN,
        Type::WtextN,
        Type::CharN,
        Type::BinaryN,
        Type::BitN,
        Type::Nothing,
    ];

    /// Whether this tag carries a null flag.
    #[must_use]
    pub fn is_nullable(self) -> bool {
        let v = self as u8;
        (Self::NULLABLE_OFFSET..2 * Self::NULLABLE_OFFSET).contains(&v)
    }

    /// The nullable twin of a base kind. Nullable tags and `Nothing` map to themselves.
    #[must_use]
    pub fn nullable(self) -> Type {
        let v = self as u8;
        if v < Self::NULLABLE_OFFSET {
            Self::ALL[usize::from(v + Self::NULLABLE_OFFSET)]
        } else {
            self
        }
    }

    /// The base kind of a nullable tag. Base tags and `Nothing` map to themselves.
    #[must_use]
    pub fn base(self) -> Type {
        if self.is_nullable() {
            Self::ALL[usize::from(self as u8 - Self::NULLABLE_OFFSET)]
        } else {
            self
        }
    }

    /// Fixed-length kinds whose byte size comes from `Set::size_of`.
    #[must_use]
    pub fn is_fixed_size(self) -> bool {
        matches!(self.base(), Type::Char | Type::Binary)
    }
}

impl TryFrom<u8> for Type {
    type Error = SqlDispatchError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Type::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| SqlDispatchError::BindingError(format!("unknown type tag {value}")))
    }
}

pub type Utiny = u8;
pub type Tiny = i8;
pub type Ushort = u16;
pub type Short = i16;
pub type Uint = u32;
pub type Int = i32;
pub type Ubigint = u64;
pub type Bigint = i64;
pub type Float = f32;
pub type Double = f64;
pub type Time = TimeDelta;
pub type Date = NaiveDate;
pub type Datetime = NaiveDateTime;
pub type Blob = Vec<u8>;
pub type Text = String;
/// Wide text shares `String` storage; the tag tells the driver to use its
/// national-character encoding.
pub type Wtext = String;
pub type Bit = bool;

/// Driver-neutral representation of a single SQL value.
///
/// [`ValueConversion`](crate::conversion::ValueConversion) translates record
/// fields to and from this form, so a driver only has to map `RowValues` onto its
/// own wire types:
/// ```rust
/// use sql_dispatch::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day or interval
    Time(TimeDelta),
    /// NULL value
    Null,
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RowValues::Date(value) => Some(*value),
            RowValues::Timestamp(value) => Some(value.date()),
            RowValues::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<TimeDelta> {
        if let RowValues::Time(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_twin_round_trips() {
        for ty in &Type::ALL[..Type::NULLABLE_OFFSET as usize] {
            let twin = ty.nullable();
            assert!(twin.is_nullable(), "{ty:?} -> {twin:?}");
            assert_eq!(twin.base(), *ty);
        }
        assert_eq!(Type::Nothing.nullable(), Type::Nothing);
        assert!(!Type::Nothing.is_nullable());
    }

    #[test]
    fn discriminants_match_table() {
        for (i, ty) in Type::ALL.iter().enumerate() {
            assert_eq!(*ty as usize, i);
            assert_eq!(Type::try_from(i as u8).unwrap(), *ty);
        }
        assert!(Type::try_from(39).is_err());
    }

    #[test]
    fn fixed_size_kinds() {
        assert!(Type::Char.is_fixed_size());
        assert!(Type::BinaryN.is_fixed_size());
        assert!(!Type::Blob.is_fixed_size());
        assert!(!Type::Nothing.is_fixed_size());
    }

    #[test]
    fn row_values_accessors() {
        assert_eq!(RowValues::Int(1).as_bool(), Some(&true));
        assert_eq!(RowValues::Int(7).as_bool(), None);
        let ts = RowValues::Text("2024-03-01 12:30:00".into()).as_timestamp();
        assert_eq!(
            ts.map(|t| t.date()),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(RowValues::Int(3).as_float(), Some(3.0));
        assert!(RowValues::Null.is_null());
    }
}
