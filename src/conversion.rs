//! Per-field conversion between record storage and a driver's native encoding.
//!
//! A driver keeps one [`Conversion`] per bound field, keyed by field index, and
//! runs [`bind_params`] before handing parameters to its engine and
//! [`fetch_row`] after each result row arrives. [`ValueConversion`] is a
//! ready-made hook whose native form is [`RowValues`]; drivers that speak a
//! richer wire format implement [`Conversion`] themselves.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::data::{FieldMut, FieldRef, Nullable, Set, field_at, field_at_mut};
use crate::error::SqlDispatchError;
use crate::types::{RowValues, Type};

/// Adapter between one record field and the driver's representation of it.
pub trait Conversion: Send {
    /// Record storage → driver input. Called once per parameter field per execution.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] when the field cannot be encoded.
    fn convert_param(&mut self, field: FieldRef<'_>) -> Result<(), SqlDispatchError>;

    /// Driver output → record storage. Called once per result field per row.
    ///
    /// # Errors
    /// Returns [`SqlDispatchError`] when the driver value does not fit the field.
    fn convert_result(&mut self, field: FieldMut<'_>) -> Result<(), SqlDispatchError>;
}

/// Hooks for a statement's parameters or results, keyed by field index.
pub type Conversions<C> = BTreeMap<usize, C>;

/// Run every parameter hook against its field of `set`.
///
/// # Errors
/// Returns the first binding or conversion error.
pub fn bind_params<C: Conversion>(
    set: &dyn Set,
    conversions: &mut Conversions<C>,
) -> Result<(), SqlDispatchError> {
    for (&index, conversion) in conversions.iter_mut() {
        conversion.convert_param(field_at(set, index)?)?;
    }
    Ok(())
}

/// Run every result hook, writing into the fields of `set`.
///
/// # Errors
/// Returns the first binding or conversion error; fields before it have already
/// been written.
pub fn fetch_row<C: Conversion>(
    set: &mut dyn Set,
    conversions: &mut Conversions<C>,
) -> Result<(), SqlDispatchError> {
    for (&index, conversion) in conversions.iter_mut() {
        conversion.convert_result(field_at_mut(set, index)?)?;
    }
    Ok(())
}

/// Conversion hook whose native value is a [`RowValues`].
///
/// After [`convert_param`](Conversion::convert_param) the encoded value is
/// available through [`value`](ValueConversion::value); before
/// [`convert_result`](Conversion::convert_result) the driver stores the incoming
/// column with [`set_value`](ValueConversion::set_value).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueConversion {
    ty: Type,
    value: RowValues,
}

impl ValueConversion {
    #[must_use]
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            value: RowValues::Null,
        }
    }

    /// One hook per field of `set`, keyed by index.
    #[must_use]
    pub fn for_set(set: &dyn Set) -> Conversions<ValueConversion> {
        (0..set.count())
            .map(|index| (index, ValueConversion::new(set.type_of(index))))
            .collect()
    }

    #[must_use]
    pub fn sql_type(&self) -> Type {
        self.ty
    }

    #[must_use]
    pub fn value(&self) -> &RowValues {
        &self.value
    }

    pub fn set_value(&mut self, value: RowValues) {
        self.value = value;
    }

    pub fn take_value(&mut self) -> RowValues {
        std::mem::replace(&mut self.value, RowValues::Null)
    }

    fn check_type(&self, actual: Type) -> Result<(), SqlDispatchError> {
        if actual == self.ty {
            Ok(())
        } else {
            Err(SqlDispatchError::BindingError(format!(
                "conversion bound to {:?} received a {actual:?} field",
                self.ty
            )))
        }
    }
}

impl Conversion for ValueConversion {
    fn convert_param(&mut self, field: FieldRef<'_>) -> Result<(), SqlDispatchError> {
        self.check_type(field.sql_type())?;
        self.value = to_row_value(field)?;
        Ok(())
    }

    fn convert_result(&mut self, field: FieldMut<'_>) -> Result<(), SqlDispatchError> {
        self.check_type(field.sql_type())?;
        from_row_value(&self.value, field)
    }
}

/// Collect the encoded parameter values in field order.
#[must_use]
pub fn row_values(conversions: &Conversions<ValueConversion>) -> Vec<RowValues> {
    conversions.values().map(|c| c.value().clone()).collect()
}

/// Hand a row of driver values to the result hooks, in field order.
///
/// # Errors
/// Returns [`SqlDispatchError::ConversionError`] when the row width differs from
/// the number of hooks.
pub fn load_row(
    conversions: &mut Conversions<ValueConversion>,
    row: Vec<RowValues>,
) -> Result<(), SqlDispatchError> {
    if row.len() != conversions.len() {
        return Err(SqlDispatchError::ConversionError(format!(
            "row has {} columns but {} fields are bound",
            row.len(),
            conversions.len()
        )));
    }
    for (conversion, value) in conversions.values_mut().zip(row) {
        conversion.set_value(value);
    }
    Ok(())
}

fn or_null<T>(n: &Nullable<T>, encode: impl FnOnce(&T) -> RowValues) -> RowValues {
    n.get().map_or(RowValues::Null, encode)
}

fn ubigint(value: u64) -> Result<RowValues, SqlDispatchError> {
    i64::try_from(value).map(RowValues::Int).map_err(|_| {
        SqlDispatchError::ConversionError(format!("unsigned value {value} exceeds i64 range"))
    })
}

// Fixed char fields are NUL padded; the padding is not part of the text.
fn char_text(bytes: &[u8]) -> RowValues {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    RowValues::Text(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

/// Encode one field as a [`RowValues`].
///
/// # Errors
/// Returns [`SqlDispatchError::ConversionError`] for an unsigned 64-bit value
/// above `i64::MAX`.
pub fn to_row_value(field: FieldRef<'_>) -> Result<RowValues, SqlDispatchError> {
    let value = match field {
        FieldRef::Utiny(v) => RowValues::Int(i64::from(*v)),
        FieldRef::Ushort(v) => RowValues::Int(i64::from(*v)),
        FieldRef::Uint(v) => RowValues::Int(i64::from(*v)),
        FieldRef::Ubigint(v) => ubigint(*v)?,
        FieldRef::Tiny(v) => RowValues::Int(i64::from(*v)),
        FieldRef::Short(v) => RowValues::Int(i64::from(*v)),
        FieldRef::Int(v) => RowValues::Int(i64::from(*v)),
        FieldRef::Bigint(v) => RowValues::Int(*v),
        FieldRef::Float(v) => RowValues::Float(f64::from(*v)),
        FieldRef::Double(v) => RowValues::Float(*v),
        FieldRef::Time(v) => RowValues::Time(*v),
        FieldRef::Date(v) => RowValues::Date(*v),
        FieldRef::Datetime(v) => RowValues::Timestamp(*v),
        FieldRef::Blob(v) => RowValues::Blob(v.clone()),
        FieldRef::Text(v) | FieldRef::Wtext(v) => RowValues::Text(v.clone()),
        FieldRef::Bit(v) => RowValues::Bool(*v),
        FieldRef::Char(b) => char_text(b),
        FieldRef::Binary(b) => RowValues::Blob(b.to_vec()),
        FieldRef::UtinyN(n) => or_null(n, |v| RowValues::Int(i64::from(*v))),
        FieldRef::UshortN(n) => or_null(n, |v| RowValues::Int(i64::from(*v))),
        FieldRef::UintN(n) => or_null(n, |v| RowValues::Int(i64::from(*v))),
        FieldRef::UbigintN(n) => match n.get() {
            Some(v) => ubigint(*v)?,
            None => RowValues::Null,
        },
        FieldRef::TinyN(n) => or_null(n, |v| RowValues::Int(i64::from(*v))),
        FieldRef::ShortN(n) => or_null(n, |v| RowValues::Int(i64::from(*v))),
        FieldRef::IntN(n) => or_null(n, |v| RowValues::Int(i64::from(*v))),
        FieldRef::BigintN(n) => or_null(n, |v| RowValues::Int(*v)),
        FieldRef::FloatN(n) => or_null(n, |v| RowValues::Float(f64::from(*v))),
        FieldRef::DoubleN(n) => or_null(n, |v| RowValues::Float(*v)),
        FieldRef::TimeN(n) => or_null(n, |v| RowValues::Time(*v)),
        FieldRef::DateN(n) => or_null(n, |v| RowValues::Date(*v)),
        FieldRef::DatetimeN(n) => or_null(n, |v| RowValues::Timestamp(*v)),
        FieldRef::BlobN(n) => or_null(n, |v| RowValues::Blob(v.clone())),
        FieldRef::TextN(n) | FieldRef::WtextN(n) => or_null(n, |v| RowValues::Text(v.clone())),
        FieldRef::BitN(n) => or_null(n, |v| RowValues::Bool(*v)),
        FieldRef::CharN(b, null) => {
            if null {
                RowValues::Null
            } else {
                char_text(b)
            }
        }
        FieldRef::BinaryN(b, null) => {
            if null {
                RowValues::Null
            } else {
                RowValues::Blob(b.to_vec())
            }
        }
    };
    Ok(value)
}

fn mismatch(expected: &str, value: &RowValues) -> SqlDispatchError {
    SqlDispatchError::ConversionError(format!("expected {expected}, got {value:?}"))
}

fn int<T: TryFrom<i64>>(value: &RowValues) -> Result<T, SqlDispatchError> {
    let i = match value {
        RowValues::Int(i) => *i,
        RowValues::Bool(b) => i64::from(*b),
        other => return Err(mismatch("an integer", other)),
    };
    T::try_from(i).map_err(|_| {
        SqlDispatchError::ConversionError(format!(
            "integer {i} out of range for {}",
            std::any::type_name::<T>()
        ))
    })
}

#[allow(clippy::cast_possible_truncation)]
fn float(value: &RowValues) -> Result<f32, SqlDispatchError> {
    value
        .as_float()
        .map(|f| f as f32)
        .ok_or_else(|| mismatch("a float", value))
}

fn double(value: &RowValues) -> Result<f64, SqlDispatchError> {
    value.as_float().ok_or_else(|| mismatch("a double", value))
}

fn time(value: &RowValues) -> Result<chrono::TimeDelta, SqlDispatchError> {
    value.as_time().ok_or_else(|| mismatch("a time", value))
}

fn date(value: &RowValues) -> Result<chrono::NaiveDate, SqlDispatchError> {
    value.as_date().ok_or_else(|| mismatch("a date", value))
}

fn datetime(value: &RowValues) -> Result<NaiveDateTime, SqlDispatchError> {
    value
        .as_timestamp()
        .ok_or_else(|| mismatch("a timestamp", value))
}

fn bytes(value: &RowValues) -> Result<Vec<u8>, SqlDispatchError> {
    match value {
        RowValues::Blob(b) => Ok(b.clone()),
        RowValues::Text(s) => Ok(s.as_bytes().to_vec()),
        other => Err(mismatch("binary data", other)),
    }
}

fn text(value: &RowValues) -> Result<String, SqlDispatchError> {
    value
        .as_text()
        .map(str::to_owned)
        .ok_or_else(|| mismatch("text", value))
}

fn bit(value: &RowValues) -> Result<bool, SqlDispatchError> {
    value.as_bool().copied().ok_or_else(|| mismatch("a bit", value))
}

fn fill<T>(
    ty: Type,
    value: &RowValues,
    slot: &mut T,
    decode: fn(&RowValues) -> Result<T, SqlDispatchError>,
) -> Result<(), SqlDispatchError> {
    if value.is_null() {
        return Err(SqlDispatchError::ConversionError(format!(
            "NULL received for non-nullable {ty:?} field"
        )));
    }
    *slot = decode(value)?;
    Ok(())
}

fn fill_nullable<T>(
    value: &RowValues,
    slot: &mut Nullable<T>,
    decode: fn(&RowValues) -> Result<T, SqlDispatchError>,
) -> Result<(), SqlDispatchError> {
    if value.is_null() {
        slot.set_null(true);
    } else {
        slot.set(decode(value)?);
    }
    Ok(())
}

fn fill_fixed(ty: Type, value: &RowValues, buf: &mut [u8]) -> Result<(), SqlDispatchError> {
    let src = bytes(value)?;
    if src.len() > buf.len() {
        return Err(SqlDispatchError::ConversionError(format!(
            "{} bytes do not fit {ty:?} field of {} bytes",
            src.len(),
            buf.len()
        )));
    }
    buf[..src.len()].copy_from_slice(&src);
    buf[src.len()..].fill(0);
    Ok(())
}

/// Decode a [`RowValues`] into one field.
///
/// # Errors
/// Returns [`SqlDispatchError::ConversionError`] when the value has the wrong
/// shape, is out of range, does not fit a fixed field, or is NULL for a
/// non-nullable field.
pub fn from_row_value(value: &RowValues, field: FieldMut<'_>) -> Result<(), SqlDispatchError> {
    let ty = field.sql_type();
    match field {
        FieldMut::Utiny(slot) => fill(ty, value, slot, int),
        FieldMut::Ushort(slot) => fill(ty, value, slot, int),
        FieldMut::Uint(slot) => fill(ty, value, slot, int),
        FieldMut::Ubigint(slot) => fill(ty, value, slot, int),
        FieldMut::Tiny(slot) => fill(ty, value, slot, int),
        FieldMut::Short(slot) => fill(ty, value, slot, int),
        FieldMut::Int(slot) => fill(ty, value, slot, int),
        FieldMut::Bigint(slot) => fill(ty, value, slot, int),
        FieldMut::Float(slot) => fill(ty, value, slot, float),
        FieldMut::Double(slot) => fill(ty, value, slot, double),
        FieldMut::Time(slot) => fill(ty, value, slot, time),
        FieldMut::Date(slot) => fill(ty, value, slot, date),
        FieldMut::Datetime(slot) => fill(ty, value, slot, datetime),
        FieldMut::Blob(slot) => fill(ty, value, slot, bytes),
        FieldMut::Text(slot) | FieldMut::Wtext(slot) => fill(ty, value, slot, text),
        FieldMut::Bit(slot) => fill(ty, value, slot, bit),
        FieldMut::UtinyN(slot) => fill_nullable(value, slot, int),
        FieldMut::UshortN(slot) => fill_nullable(value, slot, int),
        FieldMut::UintN(slot) => fill_nullable(value, slot, int),
        FieldMut::UbigintN(slot) => fill_nullable(value, slot, int),
        FieldMut::TinyN(slot) => fill_nullable(value, slot, int),
        FieldMut::ShortN(slot) => fill_nullable(value, slot, int),
        FieldMut::IntN(slot) => fill_nullable(value, slot, int),
        FieldMut::BigintN(slot) => fill_nullable(value, slot, int),
        FieldMut::FloatN(slot) => fill_nullable(value, slot, float),
        FieldMut::DoubleN(slot) => fill_nullable(value, slot, double),
        FieldMut::TimeN(slot) => fill_nullable(value, slot, time),
        FieldMut::DateN(slot) => fill_nullable(value, slot, date),
        FieldMut::DatetimeN(slot) => fill_nullable(value, slot, datetime),
        FieldMut::BlobN(slot) => fill_nullable(value, slot, bytes),
        FieldMut::TextN(slot) | FieldMut::WtextN(slot) => fill_nullable(value, slot, text),
        FieldMut::BitN(slot) => fill_nullable(value, slot, bit),
        FieldMut::Char(buf) | FieldMut::Binary(buf) => {
            if value.is_null() {
                return Err(SqlDispatchError::ConversionError(format!(
                    "NULL received for non-nullable {ty:?} field"
                )));
            }
            fill_fixed(ty, value, buf)
        }
        FieldMut::CharN(buf, null) | FieldMut::BinaryN(buf, null) => {
            if value.is_null() {
                *null = true;
                return Ok(());
            }
            fill_fixed(ty, value, buf)?;
            *null = false;
            Ok(())
        }
    }
}
